//! Password hashing and input normalization
//!
//! argon2 is CPU-bound, so the async entry points run it on the blocking pool.

use std::sync::LazyLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("argon2: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("password task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Verified against when the account does not exist, so an unknown email
/// costs the same argon2 run as a wrong password.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password_blocking("no-such-account").unwrap_or_default());

fn hash_password_blocking(password: &str) -> Result<String, PasswordError> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}

fn verify_password_blocking(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password_blocking(&password)).await?
}

/// Check `password` against the stored hash. `None` (no such account) runs
/// the same verification against [`DUMMY_HASH`] and never matches.
pub async fn verify_password(
    password: String,
    stored_hash: Option<String>,
) -> Result<bool, PasswordError> {
    let matched = tokio::task::spawn_blocking(move || match stored_hash.as_deref() {
        Some(hash) => verify_password_blocking(&password, hash),
        None => {
            verify_password_blocking(&password, &DUMMY_HASH);
            false
        }
    })
    .await?;
    Ok(matched)
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
