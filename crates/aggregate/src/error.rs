use common::AppError;
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("item not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store error while hydrating aggregate: {0}")]
    Store(#[from] StoreError),
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::Validation(msg) => AppError::Validation(msg),
            AggregateError::NotFound => AppError::NotFound("inventory item not found".to_string()),
            AggregateError::Conflict(msg) => AppError::Conflict(msg),
            AggregateError::Store(e) => AppError::from(e),
        }
    }
}
