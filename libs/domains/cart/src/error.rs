use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::TxnError;
use sea_orm::SqlErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("No cart row for product {0}")]
    ItemNotFound(i32),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Concurrent update conflict, retries exhausted")]
    Serialization,

    #[error("Database error: {0}")]
    Database(String),
}

pub type CartResult<T> = Result<T, CartError>;

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found or inactive", id))
            }
            CartError::ItemNotFound(id) => {
                AppError::NotFound(format!("No cart row for product {}", id))
            }
            CartError::Validation(msg) => AppError::BadRequest(msg),
            CartError::Serialization => {
                AppError::Conflict("Concurrent update conflict, please retry".to_string())
            }
            CartError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CartError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for CartError {
    fn from(err: sea_orm::DbErr) -> Self {
        CartError::Database(err.to_string())
    }
}

impl From<TxnError<CartError>> for CartError {
    fn from(err: TxnError<CartError>) -> Self {
        match err {
            TxnError::Abort(e) => e,
            // UNIQUE(user_id, product_id) backstops racing inserts
            TxnError::Db(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                CartError::Serialization
            }
            TxnError::Db(e) if database::is_serialization_failure(&e) => CartError::Serialization,
            TxnError::Db(e) => CartError::Database(e.to_string()),
        }
    }
}
