pub mod cache_worker;
pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;

use cache_worker::CacheCoherenceWorker;
use common::{ConsumerGroupRuntime, IdempotentProducer};
use config::AppConfig;
use state::{AnyCache, AppState};
use std::sync::Arc;
use std::time::Duration;
use store::InventoryStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wires config → store → cache → axum app, and starts the background
/// cache-coherence consumer alongside it, the way the listener's
/// consumer-group runtime is wired in `listener-service::ListenerService`
/// — just against the read side's reader pool and cache instead of the
/// single-writer store.
pub async fn run_server() -> anyhow::Result<()> {
    let config = Arc::new(AppConfig::from_env());
    info!(sqlite_path = %config.settings.sqlite_path, "query-service configuration loaded");

    let store = InventoryStore::connect(&config.settings.sqlite_path).await?;
    let cache = AnyCache::from_settings(config.settings.use_cache, config.settings.redis_url.as_deref()).await;
    let cache_ttl = Duration::from_secs(config.settings.cache_ttl_secs);

    let cancel = CancellationToken::new();
    let worker_handle = spawn_cache_worker(&config, store.clone(), cache.clone(), cache_ttl, cancel.clone()).await?;

    let state = AppState {
        config: config.clone(),
        store,
        cache,
        cache_ttl,
        stock_ttl: cache_ttl / 2,
    };

    let app = routes::create_route(state);
    let addr = config.http.listen_address();
    info!(%addr, "query-service listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    worker_handle.abort();
    Ok(())
}

/// Spawns the consumer-group runtime that keeps the cache coherent,
/// subscribed to the same `inventory.items`/`inventory.stock` topics the
/// listener writes Confirmed events onto. Runs under its own consumer
/// group id so it never steals partitions from the listener's group.
async fn spawn_cache_worker(
    config: &AppConfig,
    store: InventoryStore,
    cache: AnyCache,
    ttl: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let settings = &config.settings;
    let group_id = format!("{}-cache", settings.group_id);

    let runtime = Arc::new(ConsumerGroupRuntime::new(
        &settings.brokers,
        &group_id,
        &[settings.topic_items.as_str(), settings.topic_stock.as_str()],
        settings.max_retries,
        settings.retry_delay_ms,
        settings.dead_letter_queue,
        settings.dlq_topic.clone(),
    )?);
    let producer = Arc::new(IdempotentProducer::new(&settings.brokers, &settings.acks, settings.retries)?);
    let worker = Arc::new(CacheCoherenceWorker::new(store, cache, ttl));

    Ok(tokio::spawn(async move {
        if let Err(e) = runtime.run(worker, producer, cancel).await {
            error!(error = %e, "cache-coherence consumer exited with an error");
        }
    }))
}

async fn shutdown_signal(cancel: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, stopping cache-coherence consumer and draining connections");
    cancel.cancel();
}
