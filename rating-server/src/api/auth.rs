//! Authentication API handlers
//!
//! POST /api/auth/register        - self-registration, role `user`
//! POST /api/auth/admin/register  - admin self-registration (config gated)
//! POST /api/auth/login           - any role
//! POST /api/auth/admin/login     - admins only
//! PUT  /api/auth/password        - change own password
//! GET  /api/auth/me              - own profile

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, User, UserInfo, UserProfile};

use crate::auth::CurrentUser;
use crate::db::{RepoError, users};
use crate::error::ServiceResult;
use crate::security_log;
use crate::state::AppState;
use crate::util;
use crate::validation::{ChangePasswordRequest, LoginRequest, RegisterRequest, ValidatedJson};

// ── Response types ──

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserInfo,
}

// ── Helpers ──

/// Account fields after validation; the password is still plain text
pub(crate) struct AccountInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Role,
}

/// Create an account with a normalized email and a hashed password.
///
/// The pre-check gives the common case a clean error; the unique index
/// catches the race between two registrations of one email.
pub(crate) async fn create_account(state: &AppState, input: AccountInput) -> ServiceResult<User> {
    let email = util::normalize_email(&input.email);
    if users::email_exists(&state.pool, &email).await? {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists).into());
    }

    let password_hash = util::hash_password(input.password)
        .await
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let created = users::create(
        &state.pool,
        users::NewUser {
            name: input.name,
            email,
            password_hash,
            address: input.address,
            role: input.role,
        },
    )
    .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, role = %user.role, "Account created");
            Ok(user)
        }
        Err(RepoError::Duplicate(_)) => Err(AppError::new(ErrorCode::EmailAlreadyExists).into()),
        Err(e) => Err(e.into()),
    }
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    state
        .jwt_service
        .generate_token(user.id, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))
}

/// Resolve credentials to a user. Every failure is the same 401, and an
/// unknown email still pays for a password verification.
async fn authenticate(state: &AppState, req: &LoginRequest) -> ServiceResult<User> {
    let email = util::normalize_email(&req.email);
    let user = users::find_by_email(&state.pool, &email).await?;

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let matched = util::verify_password(req.password.clone(), stored_hash)
        .await
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;

    match user {
        Some(user) if matched => Ok(user),
        Some(_) => {
            security_log!("WARN", "login_failed", email = email, reason = "wrong_password");
            Err(AppError::invalid_credentials().into())
        }
        None => {
            security_log!("WARN", "login_failed", email = email, reason = "unknown_email");
            Err(AppError::invalid_credentials().into())
        }
    }
}

// ── POST /api/auth/register ──

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ServiceResult<(StatusCode, Json<AuthResponse>)> {
    let user = create_account(
        &state,
        AccountInput {
            name: req.name,
            email: req.email,
            password: req.password,
            address: req.address,
            role: Role::User,
        },
    )
    .await?;

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: UserInfo::from(&user),
        }),
    ))
}

// ── POST /api/auth/admin/register ──

pub async fn register_admin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ServiceResult<(StatusCode, Json<AuthResponse>)> {
    if !state.config.allow_admin_registration {
        security_log!("WARN", "admin_register_blocked", email = req.email.clone());
        return Err(AppError::new(ErrorCode::AdminRegistrationDisabled).into());
    }

    let user = create_account(
        &state,
        AccountInput {
            name: req.name,
            email: req.email,
            password: req.password,
            address: req.address,
            role: Role::Admin,
        },
    )
    .await?;
    security_log!("INFO", "admin_registered", user_id = user.id);

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Admin registered successfully",
            token,
            user: UserInfo::from(&user),
        }),
    ))
}

// ── POST /api/auth/login ──

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ServiceResult<Json<AuthResponse>> {
    let user = authenticate(&state, &req).await?;
    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = user.id, role = %user.role, "Login successful");

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: UserInfo::from(&user),
    }))
}

// ── POST /api/auth/admin/login ──

pub async fn admin_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ServiceResult<Json<AuthResponse>> {
    let user = authenticate(&state, &req).await?;
    if user.role != Role::Admin {
        security_log!("WARN", "admin_login_denied", user_id = user.id, role = user.role.as_str());
        return Err(AppError::invalid_credentials().into());
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = user.id, "Admin login successful");

    Ok(Json(AuthResponse {
        message: "Admin login successful",
        token,
        user: UserInfo::from(&user),
    }))
}

// ── PUT /api/auth/password ──

pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ServiceResult<Json<Value>> {
    let user = users::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let matched = util::verify_password(req.current_password, Some(user.password_hash.clone()))
        .await
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;
    if !matched {
        security_log!("WARN", "password_change_failed", user_id = user.id);
        return Err(AppError::new(ErrorCode::InvalidCurrentPassword).into());
    }

    let password_hash = util::hash_password(req.new_password)
        .await
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
    if !users::update_password(&state.pool, user.id, &password_hash).await? {
        return Err(AppError::new(ErrorCode::UserNotFound).into());
    }
    security_log!("INFO", "password_changed", user_id = user.id);

    Ok(Json(json!({ "message": "Password updated successfully" })))
}

// ── GET /api/auth/me ──

pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ServiceResult<Json<UserProfile>> {
    let user = users::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(UserProfile::from(user)))
}
