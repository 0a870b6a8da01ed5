use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::TxnError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Category not found: {0}")]
    CategoryNotFound(i32),

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Category {0} does not exist or is inactive")]
    InvalidCategory(i32),

    #[error("Category {0} still has active products")]
    CategoryInUse(i32),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Concurrent update conflict, retries exhausted")]
    Serialization,

    #[error("Database error: {0}")]
    Database(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CategoryNotFound(id) => {
                AppError::NotFound(format!("Category {} not found or inactive", id))
            }
            CatalogError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found or inactive", id))
            }
            CatalogError::InvalidCategory(id) => {
                AppError::BadRequest(format!("Category {} not found or inactive", id))
            }
            CatalogError::CategoryInUse(id) => {
                AppError::Conflict(format!("Category {} still has active products", id))
            }
            CatalogError::Validation(msg) => AppError::BadRequest(msg),
            CatalogError::Serialization => {
                AppError::Conflict("Concurrent update conflict, please retry".to_string())
            }
            CatalogError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        CatalogError::Database(err.to_string())
    }
}

impl From<TxnError<CatalogError>> for CatalogError {
    fn from(err: TxnError<CatalogError>) -> Self {
        match err {
            TxnError::Abort(e) => e,
            TxnError::Db(e) if database::is_serialization_failure(&e) => {
                CatalogError::Serialization
            }
            TxnError::Db(e) => CatalogError::Database(e.to_string()),
        }
    }
}
