//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the HTTP status code for this error code
    ///
    /// Conflicts (duplicate emails, an owner with a second store) are
    /// reported as 400 like any other rejected input.
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound
            | Self::UserNotFound
            | Self::StoreNotFound
            | Self::OwnerStoreNotFound => StatusCode::NOT_FOUND,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::RoleRequired
            | Self::CannotDeleteSelf
            | Self::AdminRegistrationDisabled => StatusCode::FORBIDDEN,

            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation, conflicts, business rules)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
