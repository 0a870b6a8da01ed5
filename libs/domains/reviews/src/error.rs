use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::TxnError;
use sea_orm::SqlErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Review not found: {0}")]
    ReviewNotFound(i32),

    #[error("This product review already exists")]
    Duplicate,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Concurrent update conflict, retries exhausted")]
    Serialization,

    #[error("Database error: {0}")]
    Database(String),
}

pub type ReviewResult<T> = Result<T, ReviewError>;

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found or inactive", id))
            }
            ReviewError::ReviewNotFound(id) => {
                AppError::NotFound(format!("Review {} not found", id))
            }
            ReviewError::Duplicate => {
                AppError::Conflict("This product review already exists".to_string())
            }
            ReviewError::Validation(msg) => AppError::BadRequest(msg),
            ReviewError::Serialization => {
                AppError::Conflict("Concurrent update conflict, please retry".to_string())
            }
            ReviewError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for ReviewError {
    fn from(err: sea_orm::DbErr) -> Self {
        ReviewError::Database(err.to_string())
    }
}

impl From<TxnError<ReviewError>> for ReviewError {
    fn from(err: TxnError<ReviewError>) -> Self {
        match err {
            TxnError::Abort(e) => e,
            // The partial unique index backstops the duplicate check when two
            // reviews from the same user land concurrently
            TxnError::Db(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                ReviewError::Duplicate
            }
            TxnError::Db(e) if database::is_serialization_failure(&e) => ReviewError::Serialization,
            TxnError::Db(e) => ReviewError::Database(e.to_string()),
        }
    }
}
