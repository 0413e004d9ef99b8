//! Store-owner API handlers
//!
//! GET /api/store-owner/dashboard - rollup for the caller's store
//! GET /api/store-owner/store     - the caller's store with its rating

use axum::Json;
use axum::extract::State;
use shared::error::{AppError, ErrorCode};
use shared::models::{OwnedStore, OwnerDashboard};

use crate::auth::CurrentUser;
use crate::db::{stats, stores};
use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ServiceResult<Json<OwnerDashboard>> {
    Ok(Json(stats::owner_dashboard(&state.pool, current.id).await?))
}

pub async fn store(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ServiceResult<Json<OwnedStore>> {
    let store = stores::find_owned(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OwnerStoreNotFound))?;
    Ok(Json(store))
}
