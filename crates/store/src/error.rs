use common::AppError;
use thiserror::Error;

/// Store-local error taxonomy, converted into `common::AppError` at the
/// service boundary — the same pattern the teacher uses for its
/// crate-local `ProcessingError`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate sku: {0}")]
    DuplicateSku(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("optimistic lock failed for item {0}")]
    OptimisticLock(String),

    #[error("insufficient stock for item {0}")]
    InsufficientStock(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateSku(sku) => AppError::Conflict(format!("duplicate sku: {sku}")),
            StoreError::NotFound(id) => AppError::NotFound(format!("item not found: {id}")),
            StoreError::OptimisticLock(id) => AppError::OptimisticLock(format!("version conflict on item {id}")),
            StoreError::InsufficientStock(id) => AppError::Conflict(format!("insufficient stock for item {id}")),
            StoreError::Database(e) => AppError::Transient(format!("database error: {e}")),
            StoreError::Migration(e) => AppError::Fatal(format!("migration failed: {e}")),
        }
    }
}
