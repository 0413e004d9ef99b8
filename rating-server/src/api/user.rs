//! Rater API handlers
//!
//! GET      /api/user/stores              - stores with overall and own rating
//! POST/PUT /api/user/stores/{id}/rating  - submit or replace own rating
//! GET      /api/user/stores/{id}/rating  - own rating or null

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{Rating, StoreWithUserRating};

use crate::auth::CurrentUser;
use crate::db::{ListParams, RepoError, ratings, stores};
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::validation::{PathId, RatingRequest, ValidatedJson};

#[derive(Debug, Serialize)]
pub struct SubmitRatingResponse {
    pub message: &'static str,
    pub rating: Rating,
}

fn store_not_found(store_id: i64) -> AppError {
    AppError::new(ErrorCode::StoreNotFound).with_detail("store_id", store_id)
}

pub async fn list_stores(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListParams>,
) -> ServiceResult<Json<Vec<StoreWithUserRating>>> {
    let rows = stores::list_for_rater(&state.pool, current.id, &params).await?;
    Ok(Json(rows))
}

/// First submission answers 201, a resubmission 200 with the replaced row
pub async fn submit_rating(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(store_id): PathId,
    ValidatedJson(req): ValidatedJson<RatingRequest>,
) -> ServiceResult<(StatusCode, Json<SubmitRatingResponse>)> {
    let Some(value) = req.value() else {
        return Err(AppError::validation("Rating must be between 1 and 5").into());
    };
    if !stores::exists(&state.pool, store_id).await? {
        return Err(store_not_found(store_id).into());
    }

    // the store can vanish between the check and the write
    let submission = match ratings::upsert(&state.pool, current.id, store_id, value).await {
        Ok(submission) => submission,
        Err(RepoError::InvalidReference(_)) => return Err(store_not_found(store_id).into()),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        user_id = current.id,
        store_id,
        rating = value,
        created = submission.is_created(),
        "Rating recorded"
    );

    let (status, message) = if submission.is_created() {
        (StatusCode::CREATED, "Rating submitted successfully")
    } else {
        (StatusCode::OK, "Rating updated successfully")
    };
    Ok((
        status,
        Json(SubmitRatingResponse {
            message,
            rating: submission.rating().clone(),
        }),
    ))
}

pub async fn get_rating(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(store_id): PathId,
) -> ServiceResult<Json<Value>> {
    if !stores::exists(&state.pool, store_id).await? {
        return Err(store_not_found(store_id).into());
    }
    let rating = ratings::find(&state.pool, current.id, store_id).await?;
    Ok(Json(json!({ "rating": rating.map(|r| r.rating) })))
}
