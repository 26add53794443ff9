use crate::auth::require_bearer_token;
use crate::handlers::{health, items};
use crate::state::AppState;
use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Mirrors the teacher's `webhook::routes::create_route`: a `Router` with
/// `with_state`, then one `ServiceBuilder` layering trace + CORS. The
/// write routes additionally carry the bearer-auth middleware (spec §1's
/// out-of-scope JWT check, stood in here by a static shared secret).
pub fn create_route(state: AppState) -> Router {
    let item_routes = Router::new()
        .route("/items", post(items::create_item))
        .route("/items/{id}", put(items::update_item).delete(items::delete_item))
        .route("/items/{id}/adjust", post(items::adjust_stock))
        .route("/items/{id}/reserve", post(items::reserve_stock))
        .route("/items/{id}/release", post(items::release_stock))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token));

    Router::new()
        .merge(item_routes)
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(tower_http::cors::Any).allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                ])),
        )
}
