//! Error codes for the store rating service
//!
//! Codes are grouped by leading digit:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Account errors
//! - 4xxx: Store errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried in every error envelope
///
/// Serialized as its numeric value so clients can switch on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request (malformed body, bad path parameter)
    InvalidRequest = 5,
    /// Too many requests from one client
    TooManyRequests = 6,

    // ==================== 1xxx: Auth ====================
    /// No credentials were presented
    NotAuthenticated = 1001,
    /// Email/password pair did not match
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid or its subject no longer exists
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Caller's role is not allowed on this route
    RoleRequired = 2002,
    /// Admins cannot delete their own account
    CannotDeleteSelf = 2003,
    /// Admin self-registration is turned off
    AdminRegistrationDisabled = 2004,

    // ==================== 3xxx: Account ====================
    /// User not found
    UserNotFound = 3001,
    /// Email already registered
    EmailAlreadyExists = 3002,
    /// Current password did not match on password change
    InvalidCurrentPassword = 3003,

    // ==================== 4xxx: Store ====================
    /// Store not found
    StoreNotFound = 4001,
    /// Store email already in use
    StoreEmailExists = 4002,
    /// Owner id does not reference a store owner
    InvalidStoreOwner = 4003,
    /// Store owner already owns a store
    OwnerAlreadyHasStore = 4004,
    /// Calling store owner has no store
    OwnerStoreNotFound = 4005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default client-facing message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::TooManyRequests => "Too many requests, please try again later",

            ErrorCode::NotAuthenticated => "Access token required",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Token expired",
            ErrorCode::TokenInvalid => "Invalid token",

            ErrorCode::RoleRequired => "Insufficient permissions",
            ErrorCode::CannotDeleteSelf => "Cannot delete your own account",
            ErrorCode::AdminRegistrationDisabled => "Admin registration is disabled",

            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailAlreadyExists => "Email already registered",
            ErrorCode::InvalidCurrentPassword => "Current password is incorrect",

            ErrorCode::StoreNotFound => "Store not found",
            ErrorCode::StoreEmailExists => "Store email already exists",
            ErrorCode::InvalidStoreOwner => "Invalid store owner ID",
            ErrorCode::OwnerAlreadyHasStore => "Store owner already has a store",
            ErrorCode::OwnerStoreNotFound => "No store found for this owner",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            6 => ErrorCode::TooManyRequests,

            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,

            2002 => ErrorCode::RoleRequired,
            2003 => ErrorCode::CannotDeleteSelf,
            2004 => ErrorCode::AdminRegistrationDisabled,

            3001 => ErrorCode::UserNotFound,
            3002 => ErrorCode::EmailAlreadyExists,
            3003 => ErrorCode::InvalidCurrentPassword,

            4001 => ErrorCode::StoreNotFound,
            4002 => ErrorCode::StoreEmailExists,
            4003 => ErrorCode::InvalidStoreOwner,
            4004 => ErrorCode::OwnerAlreadyHasStore,
            4005 => ErrorCode::OwnerStoreNotFound,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
