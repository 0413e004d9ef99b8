//! Application state

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::{JwtService, RateLimiter};
use crate::config::Config;
use crate::db::{DbService, users};
use crate::util;
use shared::models::Role;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const BOOTSTRAP_ADMIN_NAME: &str = "System Administrator";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Open the database, run migrations and seed the bootstrap admin
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url).await?;
        let state = Self::with_pool(db.pool, config);
        state.ensure_bootstrap_admin().await?;
        Ok(state)
    }

    /// Build state around an existing pool
    pub fn with_pool(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            config: Arc::new(config),
            rate_limiter: RateLimiter::new(),
        }
    }

    /// Create the configured admin account if it does not exist yet
    pub async fn ensure_bootstrap_admin(&self) -> Result<(), BoxError> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        let email = util::normalize_email(email);
        if users::email_exists(&self.pool, &email).await? {
            return Ok(());
        }

        let password_hash = util::hash_password(password.to_string())
            .await
            .map_err(|e| format!("hash bootstrap password: {e}"))?;
        let admin = users::create(
            &self.pool,
            users::NewUser {
                name: BOOTSTRAP_ADMIN_NAME.to_string(),
                email,
                password_hash,
                address: String::new(),
                role: Role::Admin,
            },
        )
        .await?;
        tracing::info!(user_id = admin.id, email = %admin.email, "Bootstrap admin created");
        Ok(())
    }
}
