use async_trait::async_trait;
use common::consumer::EventHandler;
use common::envelope::Event;
use common::events::{
    InventoryItemCreatedConfirmed, InventoryItemDeletedConfirmed, InventoryItemUpdatedConfirmed, StockAdjustedConfirmed,
    StockReleasedConfirmed, StockReservedConfirmed,
};
use common::{AppError, EventPublisher, InventoryEvent, InventoryItem};
use std::sync::Arc;
use store::{ApplyOutcome, InventoryStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Stateless dispatcher from `InventoryEvent` to a store mutation, see
/// spec §4.5. One instance is shared across the Listener's consumer
/// tasks — all mutable state lives in `store`. Generic over the
/// publisher so confirmation-publish can be exercised in tests without
/// a running broker.
pub struct EventApplier<P: EventPublisher> {
    store: InventoryStore,
    producer: Arc<P>,
    cancel: CancellationToken,
}

impl<P: EventPublisher> EventApplier<P> {
    pub fn new(store: InventoryStore, producer: Arc<P>, cancel: CancellationToken) -> Self {
        Self { store, producer, cancel }
    }

    /// Publishes a `*Confirmed` event. Best-effort per spec §4.5 step 5:
    /// failure is logged, not propagated — the apply already committed,
    /// the store is the source of truth, and a missed confirmation just
    /// means the cache refills on its next miss instead of eagerly.
    async fn confirm<T: Event>(&self, event: T) {
        if let Err(e) = self.producer.publish_event(event, &self.cancel).await {
            warn!(error = %e, "failed to publish confirmation event");
        }
    }
}

#[async_trait]
impl<P: EventPublisher> EventHandler for EventApplier<P> {
    async fn handle(&self, event: InventoryEvent) -> Result<(), AppError> {
        match event {
            InventoryEvent::Confirmed { event_type, event_id, .. } => {
                // Confirmation-cycle decision (a): the applier ignores
                // events it emitted itself rather than routing
                // confirmations to a second topic.
                debug!(event_type, event_id, "ignoring confirmed event");
                Ok(())
            }
            InventoryEvent::ItemCreated(envelope) => {
                let outcome = self
                    .store
                    .insert_item(
                        &envelope.event_id,
                        envelope.data.item_id,
                        &envelope.data.sku,
                        &envelope.data.name,
                        envelope.data.description.as_deref(),
                        envelope.data.quantity,
                    )
                    .await
                    .map_err(AppError::from)?;

                if let ApplyOutcome::Applied(item) = outcome {
                    self.confirm(InventoryItemCreatedConfirmed {
                        item_id: item.id,
                        sku: item.sku,
                        name: item.name,
                        description: item.description,
                        quantity: item.quantity,
                        version: item.version,
                    })
                    .await;
                }
                Ok(())
            }
            InventoryEvent::ItemUpdated(envelope) => {
                let outcome = self
                    .store
                    .update_item(&envelope.event_id, envelope.data.item_id, &envelope.data.name, envelope.data.description.as_deref())
                    .await
                    .map_err(AppError::from)?;

                if let ApplyOutcome::Applied(item) = outcome {
                    self.confirm(InventoryItemUpdatedConfirmed {
                        item_id: item.id,
                        sku: item.sku,
                        name: item.name,
                        description: item.description,
                        version: item.version,
                    })
                    .await;
                }
                Ok(())
            }
            InventoryEvent::ItemDeleted(envelope) => {
                let outcome = self
                    .store
                    .delete_item(&envelope.event_id, envelope.data.item_id)
                    .await
                    .map_err(AppError::from)?;

                if let ApplyOutcome::Applied(item) = outcome {
                    self.confirm(InventoryItemDeletedConfirmed { item_id: item.id, sku: item.sku }).await;
                }
                Ok(())
            }
            InventoryEvent::StockAdjusted(envelope) => {
                let outcome = self
                    .store
                    .adjust_stock(&envelope.event_id, envelope.data.item_id, envelope.data.adjustment)
                    .await
                    .map_err(AppError::from)?;

                if let ApplyOutcome::Applied(item) = outcome {
                    self.confirm(confirmed_adjusted(&item, envelope.data.adjustment)).await;
                }
                Ok(())
            }
            InventoryEvent::StockReserved(envelope) => {
                let outcome = self
                    .store
                    .reserve_stock(&envelope.event_id, envelope.data.item_id, envelope.data.reserved_quantity)
                    .await
                    .map_err(AppError::from)?;

                if let ApplyOutcome::Applied(item) = outcome {
                    self.confirm(confirmed_reserved(&item, envelope.data.reserved_quantity)).await;
                }
                Ok(())
            }
            InventoryEvent::StockReleased(envelope) => {
                let outcome = self
                    .store
                    .release_stock(&envelope.event_id, envelope.data.item_id, envelope.data.released_quantity)
                    .await
                    .map_err(AppError::from)?;

                if let ApplyOutcome::Applied(item) = outcome {
                    self.confirm(confirmed_released(&item, envelope.data.released_quantity)).await;
                }
                Ok(())
            }
        }
    }
}

fn confirmed_adjusted(item: &InventoryItem, adjustment: i64) -> StockAdjustedConfirmed {
    StockAdjustedConfirmed {
        item_id: item.id,
        sku: item.sku.clone(),
        adjustment,
        new_quantity: item.quantity,
        reserved_total: item.reserved,
        available_quantity: item.available,
        version: item.version,
    }
}

fn confirmed_reserved(item: &InventoryItem, reserved_quantity: i64) -> StockReservedConfirmed {
    StockReservedConfirmed {
        item_id: item.id,
        sku: item.sku.clone(),
        reserved_quantity,
        total_quantity: item.quantity,
        reserved_total: item.reserved,
        available_quantity: item.available,
        version: item.version,
    }
}

fn confirmed_released(item: &InventoryItem, released_quantity: i64) -> StockReleasedConfirmed {
    StockReleasedConfirmed {
        item_id: item.id,
        sku: item.sku.clone(),
        released_quantity,
        total_quantity: item.quantity,
        reserved_total: item.reserved,
        available_quantity: item.available,
        version: item.version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::envelope::EventEnvelope;
    use common::events::{InventoryItemCreated, StockReserved};
    use uuid::Uuid;

    /// Always succeeds without touching a broker, so applier tests can
    /// exercise the confirmation-publish path without Kafka running.
    struct NoopPublisher;

    impl EventPublisher for NoopPublisher {
        async fn publish_event<T: Event>(
            &self,
            _event: T,
            _cancel: &CancellationToken,
        ) -> Result<common::PublishOutcome, AppError> {
            Ok(common::PublishOutcome::Ok)
        }
    }

    async fn applier() -> EventApplier<NoopPublisher> {
        let store = InventoryStore::connect_in_memory().await.expect("in-memory store");
        EventApplier::new(store, Arc::new(NoopPublisher), CancellationToken::new())
    }

    #[tokio::test]
    async fn create_then_replay_is_idempotent() {
        let applier = applier().await;
        let item_id = Uuid::new_v4();
        let envelope = EventEnvelope::new(InventoryItemCreated {
            item_id,
            sku: "SKU-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            quantity: 100,
        })
        .unwrap();

        applier
            .handle(InventoryEvent::ItemCreated(envelope.clone()))
            .await
            .expect("first apply succeeds");
        applier
            .handle(InventoryEvent::ItemCreated(envelope))
            .await
            .expect("replay is a no-op, not an error");

        let item = applier.store.find_by_id(item_id).await.unwrap().expect("item exists");
        assert_eq!(item.version, 1);
    }

    #[tokio::test]
    async fn over_reserve_surfaces_as_non_retryable_conflict() {
        let applier = applier().await;
        let item_id = Uuid::new_v4();
        let create = EventEnvelope::new(InventoryItemCreated {
            item_id,
            sku: "SKU-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            quantity: 100,
        })
        .unwrap();
        applier.handle(InventoryEvent::ItemCreated(create)).await.unwrap();

        let reserve = EventEnvelope::new(StockReserved {
            item_id,
            sku: "SKU-001".to_string(),
            reserved_quantity: 500,
            total_quantity: 100,
            reserved_total: 500,
            available_quantity: -400,
        })
        .unwrap();

        let err = applier.handle(InventoryEvent::StockReserved(reserve)).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn confirmed_events_are_ignored_without_error() {
        let applier = applier().await;
        let result = applier
            .handle(InventoryEvent::Confirmed {
                event_type: "StockAdjustedConfirmed".to_string(),
                event_id: "e1".to_string(),
                aggregate_id: "a1".to_string(),
                data: serde_json::json!({}),
            })
            .await;
        assert!(result.is_ok());
    }
}
