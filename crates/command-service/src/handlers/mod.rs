pub mod health;
pub mod items;

use crate::idempotency::CachedResponse;
use crate::state::AppState;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::AppError;
use serde::Serialize;
use std::time::Duration;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Looks up the `X-Request-ID` idempotency cache (spec §1/§4.6) before a
/// command handler does any real work. `Some(response)` means the request
/// id was seen before and the cached response should be replayed verbatim.
pub fn replay(state: &AppState, headers: &HeaderMap) -> Option<Response> {
    let id = request_id(headers)?;
    let cached = state.idempotency.get(&id)?;
    Some(json_response(cached.status, cached.body))
}

/// Runs after a command handler produces its result: serializes a success
/// body, caches it under the request id (failures are never cached — see
/// `IdempotencyCache::set_if_success`), and returns the axum `Response`.
pub fn finish<T: Serialize>(state: &AppState, headers: &HeaderMap, result: Result<(StatusCode, T), AppError>) -> Response {
    match result {
        Ok((status, body)) => {
            let bytes = Bytes::from(serde_json::to_vec(&body).unwrap_or_default());
            if let Some(id) = request_id(headers) {
                let ttl = Duration::from_secs(state.config.idempotency_ttl_secs);
                state.idempotency.set_if_success(&id, CachedResponse { status, body: bytes.clone() }, ttl);
            }
            json_response(status, bytes)
        }
        Err(err) => common::ApiError::from(err).into_response(),
    }
}

fn json_response(status: StatusCode, body: Bytes) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
