//! rating-server: store rating REST service
//!
//! Users rate stores 1-5, store owners see the ratings of their store and
//! admins manage accounts and stores. Everything is served from one SQLite
//! database behind a role-gated axum router.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod state;
pub mod util;
pub mod validation;

pub use api::create_router;
pub use auth::{CurrentUser, JwtService};
pub use config::Config;
pub use db::DbService;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;

// Security events go to their own target so they can be filtered or shipped separately
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
