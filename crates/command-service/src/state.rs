use crate::config::AppConfig;
use crate::idempotency::IdempotencyCache;
use common::IdempotentProducer;
use std::sync::Arc;
use store::InventoryStore;
use tokio_util::sync::CancellationToken;

/// Shared state for the command-service's axum app, built the way the
/// teacher's `webhook::AppState` wires config + shared resources.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: InventoryStore,
    pub producer: Arc<IdempotentProducer>,
    pub idempotency: Arc<IdempotencyCache>,
    pub cancel: CancellationToken,
}
