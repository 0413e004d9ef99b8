//! Authentication and authorization
//!
//! - [`JwtService`] - token issuance and validation
//! - [`CurrentUser`] - the resolved caller
//! - [`require_auth`] - authentication middleware
//! - [`require_roles`] - role-set authorization middleware
//! - [`rate_limit`] - per-IP limits on login and registration

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUser, require_auth, require_roles};
pub use rate_limit::RateLimiter;
