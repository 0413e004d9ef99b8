//! Input validation
//!
//! Request bodies derive [`validator::Validate`] and are extracted through
//! [`ValidatedJson`], which turns both JSON rejections and rule violations
//! into the shared error envelope.

use std::borrow::Cow;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shared::error::AppError;
use shared::models::{MAX_RATING, MIN_RATING, Role};
use validator::{Validate, ValidationError, ValidationErrors};

// ── Length limits ───────────────────────────────────────────────────

/// Person and store names
pub const NAME_MIN_LEN: u64 = 20;
pub const NAME_MAX_LEN: u64 = 60;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: u64 = 254;

/// Passwords (before hashing)
pub const PASSWORD_MIN_LEN: u64 = 8;
pub const PASSWORD_MAX_LEN: u64 = 16;

/// Postal addresses
pub const MAX_ADDRESS_LEN: u64 = 400;

/// At least one of these must appear in a password
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*";

// ── Request bodies ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = NAME_MIN_LEN,
        max = NAME_MAX_LEN,
        message = "Name must be between 20 and 60 characters"
    ))]
    pub name: String,
    #[validate(
        email(message = "Please provide a valid email"),
        length(max = MAX_EMAIL_LEN, message = "Email is too long")
    )]
    pub email: String,
    #[validate(
        length(
            min = PASSWORD_MIN_LEN,
            max = PASSWORD_MAX_LEN,
            message = "Password must be between 8 and 16 characters"
        ),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = MAX_ADDRESS_LEN, message = "Address must not exceed 400 characters"))]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(
        length(
            min = PASSWORD_MIN_LEN,
            max = PASSWORD_MAX_LEN,
            message = "Password must be between 8 and 16 characters"
        ),
        custom(function = "validate_password_strength")
    )]
    pub new_password: String,
}

/// Admin-side account creation; `role` defaults to `user`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = NAME_MIN_LEN,
        max = NAME_MAX_LEN,
        message = "Name must be between 20 and 60 characters"
    ))]
    pub name: String,
    #[validate(
        email(message = "Please provide a valid email"),
        length(max = MAX_EMAIL_LEN, message = "Email is too long")
    )]
    pub email: String,
    #[validate(
        length(
            min = PASSWORD_MIN_LEN,
            max = PASSWORD_MAX_LEN,
            message = "Password must be between 8 and 16 characters"
        ),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = MAX_ADDRESS_LEN, message = "Address must not exceed 400 characters"))]
    pub address: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl CreateUserRequest {
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::User)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStoreRequest {
    #[validate(length(
        min = NAME_MIN_LEN,
        max = NAME_MAX_LEN,
        message = "Store name must be between 20 and 60 characters"
    ))]
    pub name: String,
    #[validate(
        email(message = "Please provide a valid email"),
        length(max = MAX_EMAIL_LEN, message = "Email is too long")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = MAX_ADDRESS_LEN, message = "Address must not exceed 400 characters"))]
    pub address: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
}

/// `rating` stays raw JSON so `4.5`, `"4"` or `null` fail as a field error
/// rather than a body decode error
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatingRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_rating"))]
    pub rating: Value,
}

impl RatingRequest {
    /// The integer rating; always `Some` after validation
    pub fn value(&self) -> Option<i64> {
        self.rating.as_i64()
    }
}

// ── Custom rules ────────────────────────────────────────────────────

/// One uppercase letter and one of [`PASSWORD_SPECIAL_CHARS`]
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c));
    if has_upper && has_special {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(Cow::Borrowed(
            "Password must contain at least one uppercase letter and one special character",
        )))
    }
}

/// Integer in `MIN_RATING..=MAX_RATING`
pub fn validate_rating(value: &Value) -> Result<(), ValidationError> {
    match value.as_i64() {
        Some(n) if (MIN_RATING..=MAX_RATING).contains(&n) => Ok(()),
        _ => Err(ValidationError::new("rating_range")
            .with_message(Cow::Borrowed("Rating must be between 1 and 5"))),
    }
}

// ── Extractor ───────────────────────────────────────────────────────

/// `Json<T>` followed by `T::validate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate().map_err(validation_failed)?;
        Ok(Self(value))
    }
}

/// Numeric `{id}` path segment; anything else is a 400 envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::invalid_request(e.body_text()))?;
        Ok(Self(id))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::invalid_request(rejection.body_text())
}

/// Flatten validator output into `details.errors = [{field, message}]`
pub fn validation_failed(errors: ValidationErrors) -> AppError {
    let mut entries: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                (field.to_string(), message)
            })
        })
        .collect();
    entries.sort();

    let list: Vec<_> = entries
        .into_iter()
        .map(|(field, message)| json!({ "field": field, "message": message }))
        .collect();
    AppError::validation("Validation failed").with_detail("errors", list)
}
