//! API routes for rating-server
//!
//! | Group | Paths | Gate |
//! |-------|-------|------|
//! | health | `/api/health` | public |
//! | login | `/api/auth/login`, `/api/auth/admin/login` | public, login rate limit |
//! | registration | `/api/auth/register`, `/api/auth/admin/register` | public, register rate limit |
//! | account | `/api/auth/password`, `/api/auth/me` | any role |
//! | admin | `/api/admin/*` | admin |
//! | store owner | `/api/store-owner/*` | store_owner |
//! | rater | `/api/user/*` | user |

pub mod admin;
pub mod auth;
pub mod health;
pub mod store_owner;
pub mod user;

use std::time::Duration;

use axum::http::{StatusCode, Uri};
use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};
use shared::error::AppError;
use shared::models::Role;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::{require_auth, require_roles};
use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/admin/login", post(auth::admin_login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let registration = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/admin/register", post(auth::register_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));

    let account = Router::new()
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/auth/me", get(auth::me));

    let admin = Router::new()
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route(
            "/api/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/api/admin/users/{id}",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route(
            "/api/admin/stores",
            get(admin::list_stores).post(admin::create_store),
        )
        .route("/api/admin/stores/{id}", delete(admin::delete_store))
        .layer(middleware::from_fn(require_roles(&[Role::Admin])));

    let store_owner = Router::new()
        .route("/api/store-owner/dashboard", get(store_owner::dashboard))
        .route("/api/store-owner/store", get(store_owner::store))
        .layer(middleware::from_fn(require_roles(&[Role::StoreOwner])));

    let rater = Router::new()
        .route("/api/user/stores", get(user::list_stores))
        .route(
            "/api/user/stores/{id}/rating",
            get(user::get_rating)
                .post(user::submit_rating)
                .put(user::submit_rating),
        )
        .layer(middleware::from_fn(require_roles(&[Role::User])));

    // authentication runs before any role gate
    let protected = Router::new()
        .merge(account)
        .merge(admin)
        .merge(store_owner)
        .merge(rater)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    Router::new()
        .route("/api/health", get(health::health_check))
        .merge(login)
        .merge(registration)
        .merge(protected)
        .fallback(route_not_found)
        .with_state(state)
        // outermost first
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                )),
        )
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::not_found("Route").with_detail("path", uri.path())
}
