pub mod auth;
pub mod config;
pub mod handlers;
pub mod idempotency;
pub mod routes;
pub mod state;

use common::IdempotentProducer;
use config::AppConfig;
use idempotency::IdempotencyCache;
use state::AppState;
use std::sync::Arc;
use store::InventoryStore;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wires config → store → producer → axum app and serves until a shutdown
/// signal arrives, the way the teacher's `webhook::run_server` does —
/// generalized with the cancellation token spec §5 requires so in-flight
/// publishes observe the same shutdown as the HTTP listener.
pub async fn run_server() -> anyhow::Result<()> {
    let config = Arc::new(AppConfig::from_env());
    info!(sqlite_path = %config.settings.sqlite_path, "command-service configuration loaded");

    let store = InventoryStore::connect(&config.settings.sqlite_path).await?;
    let producer = Arc::new(IdempotentProducer::new(
        &config.settings.brokers,
        &config.settings.acks,
        config.settings.retries,
    )?);
    let cancel = CancellationToken::new();

    let state = AppState {
        config: config.clone(),
        store,
        producer,
        idempotency: Arc::new(IdempotencyCache::new()),
        cancel: cancel.clone(),
    };

    let app = routes::create_route(state);
    let addr = config.http.listen_address();
    info!(%addr, "command-service listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    Ok(())
}

/// Root cancellation for this process, spec §5: SIGINT/SIGTERM cancels the
/// shared token (observed by in-flight publishes) and signals axum's
/// built-in graceful shutdown, which stops accepting new connections and
/// waits for in-flight requests to finish.
async fn shutdown_signal(cancel: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, cancelling in-flight publishes and draining connections");
    cancel.cancel();
}
