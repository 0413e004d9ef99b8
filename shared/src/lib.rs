//! Shared types for the store rating service
//!
//! Error codes, the API error envelope and the domain models used by the
//! server and by API clients.

pub mod error;
pub mod models;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
