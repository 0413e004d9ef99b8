//! CurrentUser extractor
//!
//! Handlers behind [`require_auth`](super::require_auth) take a
//! `CurrentUser` argument; the value is the one the middleware resolved.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::AppError;

use crate::auth::CurrentUser;
use crate::state::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(AppError::not_authenticated)
    }
}
