//! Server configuration

use crate::auth::JwtConfig;
use crate::auth::jwt::MIN_SECRET_LEN;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    pub jwt: JwtConfig,
    /// Allow `POST /api/auth/admin/register`
    pub allow_admin_registration: bool,
    /// Admin account created at start-up when both are set
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub request_timeout_ms: u64,
    /// Login attempts per minute per IP (0 disables)
    pub login_rate_limit: u32,
    /// Registrations per minute per IP (0 disables)
    pub register_rate_limit: u32,
    /// Take the client IP from `X-Forwarded-For`; only behind a trusted proxy
    pub trust_forwarded_for: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/store_rating.db".into(),
            http_port: 5000,
            environment: "development".into(),
            jwt: JwtConfig::default(),
            allow_admin_registration: true,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            request_timeout_ms: 30_000,
            login_rate_limit: 5,
            register_rate_limit: 3,
            trust_forwarded_for: false,
            log_format: LogFormat::Pretty,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Require a secret env var: must be set and long enough outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                tracing::warn!("{name} not set, using development fallback");
                format!("dev-{name}-not-for-production")
            }
        };
        if val.len() < MIN_SECRET_LEN && environment != "development" {
            return Err(
                format!("{name} must be at least {MIN_SECRET_LEN} characters long").into(),
            );
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let defaults = Self::default();
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_dev = environment == "development";

        let jwt = JwtConfig {
            secret: Self::require_secret("JWT_SECRET", &environment)?,
            expiration_minutes: env_parse("JWT_EXPIRATION_MINUTES")
                .unwrap_or(defaults.jwt.expiration_minutes),
            issuer: env_non_empty("JWT_ISSUER").unwrap_or(defaults.jwt.issuer),
            audience: env_non_empty("JWT_AUDIENCE").unwrap_or(defaults.jwt.audience),
        };

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            database_url: env_non_empty("DATABASE_URL").unwrap_or(defaults.database_url),
            http_port: env_parse("HTTP_PORT").unwrap_or(defaults.http_port),
            jwt,
            allow_admin_registration: env_parse("ALLOW_ADMIN_REGISTRATION").unwrap_or(is_dev),
            bootstrap_admin_email: env_non_empty("BOOTSTRAP_ADMIN_EMAIL"),
            bootstrap_admin_password: env_non_empty("BOOTSTRAP_ADMIN_PASSWORD"),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
            login_rate_limit: env_parse("LOGIN_RATE_LIMIT").unwrap_or(defaults.login_rate_limit),
            register_rate_limit: env_parse("REGISTER_RATE_LIMIT")
                .unwrap_or(defaults.register_rate_limit),
            trust_forwarded_for: env_parse("TRUST_FORWARDED_FOR")
                .unwrap_or(defaults.trust_forwarded_for),
            log_format,
            environment,
        })
    }
}
