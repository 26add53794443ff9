use async_trait::async_trait;
use cache::{keys, Cache};
use common::{AppError, EventHandler, InventoryEvent};
use std::time::Duration;
use store::InventoryStore;
use tracing::warn;
use uuid::Uuid;

/// Keeps the read cache coherent with the Confirmed event stream, spec
/// §4.7. Subscribed to the same two topics the listener writes
/// Confirmed events onto, so it also observes every raw (non-Confirmed)
/// event published by the command service — those get plain
/// invalidation rather than a refill, since there's nothing yet in the
/// store to refill from.
pub struct CacheCoherenceWorker<C: Cache> {
    store: InventoryStore,
    cache: C,
    item_ttl: Duration,
    stock_ttl: Duration,
}

impl<C: Cache> CacheCoherenceWorker<C> {
    /// `stock_ttl` is half of `item_ttl`, per spec §4.7: the `stock:<uuid>`
    /// family churns fastest and is given a shorter expiry than
    /// `item:id`/`item:sku`.
    pub fn new(store: InventoryStore, cache: C, item_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            item_ttl,
            stock_ttl: item_ttl / 2,
        }
    }

    /// Reloads `item:id`, `item:sku` and `stock` from the store for a
    /// confirmed mutation. A row that's gone (delete landed) clears the
    /// keys instead of repopulating them.
    async fn refresh(&self, id: Uuid) {
        match self.store.find_by_id(id).await {
            Ok(Some(item)) => {
                if let Ok(json) = serde_json::to_string(&item) {
                    self.try_set(&keys::item_id_key(item.id), json.clone(), self.item_ttl).await;
                    self.try_set(&keys::item_sku_key(&item.sku), json, self.item_ttl).await;
                }
                if let Ok(json) = serde_json::to_string(&common::StockStatus::from(&item)) {
                    self.try_set(&keys::stock_key(item.id), json, self.stock_ttl).await;
                }
            }
            Ok(None) => {
                self.try_delete(&keys::item_id_key(id)).await;
                self.try_delete(&keys::stock_key(id)).await;
            }
            Err(e) => warn!(error = %e, %id, "failed to refresh cache entry from the store"),
        }
    }

    async fn invalidate_all(&self) {
        for pattern in keys::ALL_PATTERNS {
            if let Err(e) = self.cache.delete_by_pattern(pattern).await {
                warn!(error = %e, pattern, "pattern invalidation failed");
            }
        }
    }

    async fn try_set(&self, key: &str, value: String, ttl: Duration) {
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!(error = %e, key, "cache write failed during refresh");
        }
    }

    async fn try_delete(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!(error = %e, key, "cache delete failed");
        }
    }

    async fn try_delete_pattern(&self, pattern: &str) {
        if let Err(e) = self.cache.delete_by_pattern(pattern).await {
            warn!(error = %e, pattern, "pattern invalidation failed");
        }
    }
}

#[async_trait]
impl<C: Cache> EventHandler for CacheCoherenceWorker<C> {
    async fn handle(&self, event: InventoryEvent) -> Result<(), AppError> {
        match &event {
            InventoryEvent::Confirmed { aggregate_id, .. } => {
                let id = Uuid::parse_str(aggregate_id).ok();
                let sku = event.confirmed_sku();

                match (id, sku) {
                    (Some(id), _) => self.refresh(id).await,
                    (None, Some(sku)) => self.try_delete(&keys::item_sku_key(sku)).await,
                    (None, None) => self.invalidate_all().await,
                }

                self.try_delete_pattern(keys::LIST_PATTERN).await;
            }
            other => {
                // Plain invalidation for non-Confirmed events, spec §4.7.
                if let Some(id) = other.aggregate_id().and_then(|s| Uuid::parse_str(s).ok()) {
                    self.try_delete(&keys::item_id_key(id)).await;
                    self.try_delete(&keys::stock_key(id)).await;
                }
                if let Some(sku) = plain_sku(other) {
                    self.try_delete(&keys::item_sku_key(sku)).await;
                }
            }
        }
        Ok(())
    }
}

/// `sku` for the handful of non-Confirmed event variants that carry one;
/// `InventoryItemUpdated` doesn't, so it falls through to the id-only
/// invalidation above.
fn plain_sku(event: &InventoryEvent) -> Option<&str> {
    match event {
        InventoryEvent::ItemCreated(e) => Some(&e.data.sku),
        InventoryEvent::ItemDeleted(e) => Some(&e.data.sku),
        InventoryEvent::StockAdjusted(e) => Some(&e.data.sku),
        InventoryEvent::StockReserved(e) => Some(&e.data.sku),
        InventoryEvent::StockReleased(e) => Some(&e.data.sku),
        InventoryEvent::ItemUpdated(_) | InventoryEvent::Confirmed { .. } => None,
    }
}
