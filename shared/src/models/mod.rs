//! Data models
//!
//! Shared between rating-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are Unix millis.

pub mod dashboard;
pub mod rating;
pub mod role;
pub mod store;
pub mod user;

// Re-exports
pub use dashboard::*;
pub use rating::*;
pub use role::*;
pub use store::*;
pub use user::*;
