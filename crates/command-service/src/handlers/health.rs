use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// `GET /health` — liveness, collaborator per spec §1.
pub async fn liveness() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// `GET /health/ready` — readiness, collaborator per spec §1. The command
/// service has no async dependency it needs to probe beyond the store
/// connection already established at startup, so readiness mirrors
/// liveness; kept as a distinct route so a future check (broker
/// connectivity, say) has somewhere to land without changing the route
/// surface.
pub async fn readiness() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": "ready"})))
}
