use common::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Transient(format!("cache error: {err}"))
    }
}
