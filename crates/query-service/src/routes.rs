use crate::handlers::{health, items};
use crate::state::AppState;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Mirrors command-service's `create_route`, minus the bearer-auth layer
/// — every route here is a read, so there is nothing to guard the way
/// the write side's mutations are.
pub fn create_route(state: AppState) -> Router {
    Router::new()
        .route("/items", get(items::list_items))
        .route("/items/{id}", get(items::get_item))
        .route("/items/{id}/stock", get(items::get_stock))
        .route("/items/sku/{sku}", get(items::get_item_by_sku))
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(tower_http::cors::Any).allow_methods([Method::GET])),
        )
}
