use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Closed vocabulary of stable error codes, see spec §7. Every
/// user-visible error body is `{code, message, details}`; this is that
/// body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Option<String>,
}

/// Shared error taxonomy across all three services.
///
/// `store`, `applier`, `aggregate` and `cache` each keep a narrower
/// crate-local error enum and `From`-convert into this one at the
/// service boundary — the same shape the teacher uses with its
/// crate-local `ProcessingError` converted into `anyhow::Error` at the
/// edges of `kafka-service`/`webhook`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("optimistic lock failed after retries: {0}")]
    OptimisticLock(String),

    #[error("transient infrastructure error: {0}")]
    Transient(String),

    #[error("fatal error: {0}")]
    Fatal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::OptimisticLock(_) => "OPTIMISTIC_LOCK_FAILED",
            AppError::Transient(_) => "TRANSIENT_ERROR",
            AppError::Fatal(_) => "FATAL_ERROR",
        }
    }

    /// Whether the consumer pipeline should retry this outcome (spec §4.5
    /// step 4) rather than route straight to the DLQ.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::OptimisticLock(_) | AppError::Transient(_))
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            details: None,
        }
    }

    /// Maps the taxonomy to an HTTP status, per spec §7.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::OptimisticLock(_) => StatusCode::CONFLICT,
            AppError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wraps `AppError` so handlers can `?`-propagate it directly into an axum
/// response body of `{code, message, details}` (spec §7), without handlers
/// ever constructing a status code or leaking a driver-specific message.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0.status_code(), Json(self.0.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_lock_and_transient_are_retryable() {
        assert!(AppError::OptimisticLock("v mismatch".into()).is_retryable());
        assert!(AppError::Transient("broker unreachable".into()).is_retryable());
    }

    #[test]
    fn validation_and_conflict_are_not_retryable() {
        assert!(!AppError::Validation("bad payload".into()).is_retryable());
        assert!(!AppError::Conflict("duplicate sku".into()).is_retryable());
        assert!(!AppError::NotFound("missing item".into()).is_retryable());
    }
}
