pub mod health;
pub mod items;

use axum::response::{IntoResponse, Response};
use common::AppError;
use serde::Serialize;

/// Turns a `Result<T, AppError>` into an axum `Response`, the read-side
/// counterpart of command-service's `finish` — no idempotency cache to
/// thread through since `GET`s are naturally safe to retry.
pub fn finish<T: Serialize>(result: Result<T, AppError>) -> Response {
    match result {
        Ok(body) => axum::Json(body).into_response(),
        Err(err) => common::ApiError::from(err).into_response(),
    }
}

/// Clamps a caller-supplied `page_size` into the 1-100 range, spec §6.
pub fn clamp_page_size(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, 100)
}

/// `page` is 1-indexed; anything less collapses to the first page.
pub fn clamp_page(requested: Option<u32>) -> u32 {
    requested.unwrap_or(1).max(1)
}
