//! Order domain errors

use crate::db::models::OrderStatus;
use crate::db::repository::RepoError;
use crate::utils::AppError;
use thiserror::Error;

/// Errors produced by the order service
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Recipient name, phone and address are required")]
    MissingRecipient,

    #[error("Insufficient stock for {product} (remaining: {remaining})")]
    InsufficientStock { product: String, remaining: i64 },

    #[error("Order not found")]
    NotFound,

    #[error("Transition {from} -> {to} is not permitted")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order in status {0} cannot be cancelled")]
    NotCancellable(OrderStatus),

    #[error("Order already processed (status: {0})")]
    AlreadyProcessed(OrderStatus),

    #[error("Failed to allocate a unique order number")]
    OrderNumberCollision,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyCart | OrderError::MissingRecipient => {
                AppError::Validation(e.to_string())
            }
            OrderError::InsufficientStock { .. }
            | OrderError::InvalidTransition { .. }
            | OrderError::NotCancellable(_)
            | OrderError::AlreadyProcessed(_)
            | OrderError::OrderNumberCollision => AppError::Conflict(e.to_string()),
            OrderError::NotFound => AppError::NotFound("Order not found".to_string()),
            OrderError::Repo(repo) => repo.into(),
        }
    }
}
