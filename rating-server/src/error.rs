//! Service-layer error type
//!
//! `ServiceError` bridges repository errors (`RepoError`, `sqlx::Error`) and
//! the API-layer error (`AppError`) so handlers can use `?` throughout.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::RepoError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// - `Db`: database/infrastructure errors (logged, surfaced as InternalError)
/// - `App`: business-rule errors (passed to the client as-is)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(what) => ServiceError::App(AppError::not_found(what)),
            RepoError::Duplicate(what) => ServiceError::App(AppError::with_message(
                ErrorCode::AlreadyExists,
                format!("{what} already exists"),
            )),
            RepoError::InvalidReference(what) => ServiceError::App(AppError::invalid_request(
                format!("Invalid {what} reference"),
            )),
            RepoError::Database(e) => ServiceError::Db(e.into()),
        }
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
