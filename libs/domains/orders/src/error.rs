use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::TxnError;
use thiserror::Error;

use crate::models::OrderStatus;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(i32),

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: i32,
        available: i32,
        requested: i32,
    },

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Unauthorized access to order {0}")]
    Unauthorized(i32),

    #[error("Concurrent update conflict, retries exhausted")]
    Serialization,

    #[error("Database error: {0}")]
    Database(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            OrderError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found or inactive", id))
            }
            OrderError::EmptyCart => AppError::BadRequest("Cart is empty".to_string()),
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            } => AppError::Conflict(format!(
                "Insufficient stock for product {}: {} available, {} requested",
                product_id, available, requested
            )),
            OrderError::InvalidTransition { from, to } => {
                AppError::Conflict(format!("Illegal status transition: {} -> {}", from, to))
            }
            OrderError::Unauthorized(id) => {
                AppError::Forbidden(format!("Access denied to order {}", id))
            }
            OrderError::Serialization => {
                AppError::Conflict("Concurrent update conflict, please retry".to_string())
            }
            OrderError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for OrderError {
    fn from(err: sea_orm::DbErr) -> Self {
        OrderError::Database(err.to_string())
    }
}

impl From<TxnError<OrderError>> for OrderError {
    fn from(err: TxnError<OrderError>) -> Self {
        match err {
            TxnError::Abort(e) => e,
            TxnError::Db(e) if database::is_serialization_failure(&e) => OrderError::Serialization,
            TxnError::Db(e) => OrderError::Database(e.to_string()),
        }
    }
}
