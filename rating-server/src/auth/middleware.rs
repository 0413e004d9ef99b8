//! Access gate
//!
//! `require_auth` resolves the bearer token to a stored user and attaches a
//! [`CurrentUser`] to the request. `require_roles` then admits only the
//! listed roles. Every protected route group goes through both.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, User};

use crate::auth::{JwtError, JwtService};
use crate::db::users;
use crate::security_log;
use crate::state::AppState;

/// The authenticated caller, as currently stored
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

impl CurrentUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Membership check behind [`require_roles`]
    pub fn ensure_any_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::RoleRequired)
                .with_detail("role", self.role.as_str())
                .with_detail(
                    "allowed",
                    allowed.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
                ))
        }
    }
}

/// Authentication middleware
///
/// | Failure | Code |
/// |---------|------|
/// | no Authorization header | 401 NotAuthenticated |
/// | malformed header, bad signature, unknown subject | 401 TokenInvalid |
/// | expired token | 401 TokenExpired |
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::not_authenticated());
        }
    };

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            uri = req.uri().to_string()
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::invalid_token("Invalid token"))?;

    let user = users::find_by_id(&state.pool, user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load authenticated user");
            AppError::new(ErrorCode::DatabaseError)
        })?
        .ok_or_else(|| {
            security_log!("WARN", "auth_unknown_subject", user_id = user_id);
            AppError::invalid_token("Invalid token")
        })?;

    req.extensions_mut().insert(CurrentUser::from(user));
    Ok(next.run(req).await)
}

/// Role gate: admits callers whose role is in `allowed`
///
/// ```ignore
/// Router::new()
///     .route("/api/admin/dashboard", get(admin::dashboard))
///     .layer(middleware::from_fn(require_roles(&[Role::Admin])));
/// ```
pub fn require_roles(
    allowed: &'static [Role],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if let Err(e) = user.ensure_any_role(allowed) {
                security_log!(
                    "WARN",
                    "role_denied",
                    user_id = user.id,
                    role = user.role.as_str(),
                    uri = req.uri().to_string()
                );
                return Err(e);
            }

            Ok(next.run(req).await)
        })
    }
}
