//! Administration API handlers
//!
//! GET    /api/admin/dashboard    - platform counters
//! GET    /api/admin/users        - filtered, sorted user listing
//! POST   /api/admin/users        - create an account with any role
//! GET    /api/admin/users/{id}   - one listing row
//! DELETE /api/admin/users/{id}   - delete an account
//! GET    /api/admin/stores       - filtered, sorted store listing
//! POST   /api/admin/stores       - create a store
//! DELETE /api/admin/stores/{id}  - delete a store

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{AdminDashboard, Role, Store, StoreListItem, UserListItem, UserProfile};

use crate::api::auth::{AccountInput, create_account};
use crate::auth::CurrentUser;
use crate::db::{ListParams, RepoError, stats, stores, users};
use crate::error::ServiceResult;
use crate::security_log;
use crate::state::AppState;
use crate::util;
use crate::validation::{CreateStoreRequest, CreateUserRequest, PathId, ValidatedJson};

// ── GET /api/admin/dashboard ──

pub async fn dashboard(State(state): State<AppState>) -> ServiceResult<Json<AdminDashboard>> {
    Ok(Json(stats::admin_dashboard(&state.pool).await?))
}

// ── Users ──

/// Blank means no filter; anything else must name a role exactly
fn parse_role_filter(value: Option<&str>) -> Result<Option<Role>, AppError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<Role>().map(Some).map_err(|e| {
        AppError::validation("Validation failed").with_detail(
            "errors",
            json!([{ "field": "role", "message": e.to_string() }]),
        )
    })
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ServiceResult<Json<Vec<UserListItem>>> {
    let role = parse_role_filter(params.role.as_deref())?;
    let rows = users::list(&state.pool, &params, role).await?;
    Ok(Json(rows))
}

pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let role = req.role();
    let user = create_account(
        &state,
        AccountInput {
            name: req.name,
            email: req.email,
            password: req.password,
            address: req.address,
            role,
        },
    )
    .await?;
    security_log!(
        "INFO",
        "admin_user_created",
        admin_id = current.id,
        user_id = user.id,
        role = role.as_str()
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": UserProfile::from(user),
        })),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ServiceResult<Json<UserListItem>> {
    let row = users::find_list_item(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound).with_detail("id", id))?;
    Ok(Json(row))
}

pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(id): PathId,
) -> ServiceResult<Json<Value>> {
    if id == current.id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf).into());
    }
    if !users::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::UserNotFound)
            .with_detail("id", id)
            .into());
    }
    security_log!("INFO", "admin_user_deleted", admin_id = current.id, user_id = id);

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

// ── Stores ──

pub async fn list_stores(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ServiceResult<Json<Vec<StoreListItem>>> {
    Ok(Json(stores::list(&state.pool, &params).await?))
}

/// The referenced user must exist, hold `store_owner`, and own nothing yet
async fn check_owner(state: &AppState, owner_id: i64) -> ServiceResult<()> {
    let owner = users::find_by_id(&state.pool, owner_id).await?;
    match owner {
        Some(user) if user.role == Role::StoreOwner => {}
        _ => {
            return Err(AppError::new(ErrorCode::InvalidStoreOwner)
                .with_detail("owner_id", owner_id)
                .into());
        }
    }
    if stores::find_by_owner(&state.pool, owner_id).await?.is_some() {
        return Err(AppError::new(ErrorCode::OwnerAlreadyHasStore)
            .with_detail("owner_id", owner_id)
            .into());
    }
    Ok(())
}

pub async fn create_store(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateStoreRequest>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let email = util::normalize_email(&req.email);
    if stores::email_exists(&state.pool, &email).await? {
        return Err(AppError::new(ErrorCode::StoreEmailExists).into());
    }
    if let Some(owner_id) = req.owner_id {
        check_owner(&state, owner_id).await?;
    }

    let created = stores::create(
        &state.pool,
        stores::NewStore {
            name: req.name,
            email,
            address: req.address,
            owner_id: req.owner_id,
        },
    )
    .await;

    // constraint fallbacks for requests racing the checks above
    let store: Store = match created {
        Ok(store) => store,
        Err(RepoError::Duplicate(what)) if what == "owner" => {
            return Err(AppError::new(ErrorCode::OwnerAlreadyHasStore).into());
        }
        Err(RepoError::Duplicate(_)) => {
            return Err(AppError::new(ErrorCode::StoreEmailExists).into());
        }
        Err(RepoError::InvalidReference(_)) => {
            return Err(AppError::new(ErrorCode::InvalidStoreOwner).into());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(
        admin_id = current.id,
        store_id = store.id,
        owner_id = ?store.owner_id,
        "Store created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Store created successfully",
            "store": store,
        })),
    ))
}

pub async fn delete_store(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(id): PathId,
) -> ServiceResult<Json<Value>> {
    if !stores::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::StoreNotFound)
            .with_detail("id", id)
            .into());
    }
    tracing::info!(admin_id = current.id, store_id = id, "Store deleted");

    Ok(Json(json!({ "message": "Store deleted successfully" })))
}
