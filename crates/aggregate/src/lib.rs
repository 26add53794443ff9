mod error;

pub use error::AggregateError;

use common::events::{
    InventoryItemCreated, InventoryItemDeleted, InventoryItemUpdated, StockAdjusted, StockReleased, StockReserved,
};
use common::InventoryItem;
use store::InventoryStore;
use uuid::Uuid;

/// In-memory, request-scoped write model, see spec §4.6. Not a
/// long-lived singleton: a fresh instance is built per command, hydrated
/// from the store's reader pool for anything but create, validated
/// against the same invariants the store itself enforces, and discarded
/// once the resulting event has been handed to the producer.
pub struct InventoryAggregate {
    current: Option<InventoryItem>,
}

impl InventoryAggregate {
    /// A command with no existing row to hydrate from, e.g. create.
    pub fn new_unloaded() -> Self {
        Self { current: None }
    }

    /// Hydrates from the store's reader pool. Returns `NotFound` if the
    /// command targets an id that doesn't exist — the command is
    /// rejected before any event is published, per spec §4.6.
    pub async fn load(store: &InventoryStore, id: Uuid) -> Result<Self, AggregateError> {
        match store.find_by_id(id).await? {
            Some(item) => Ok(Self { current: Some(item) }),
            None => Err(AggregateError::NotFound),
        }
    }

    pub fn create(
        &self,
        sku: String,
        name: String,
        description: Option<String>,
        quantity: i64,
    ) -> Result<(Uuid, InventoryItemCreated), AggregateError> {
        if quantity < 0 {
            return Err(AggregateError::Validation("quantity must be non-negative".to_string()));
        }
        if sku.trim().is_empty() {
            return Err(AggregateError::Validation("sku must not be empty".to_string()));
        }
        let item_id = Uuid::new_v4();
        Ok((
            item_id,
            InventoryItemCreated {
                item_id,
                sku,
                name,
                description,
                quantity,
            },
        ))
    }

    pub fn update(&self, name: String, description: Option<String>) -> Result<InventoryItemUpdated, AggregateError> {
        let current = self.current.as_ref().ok_or(AggregateError::NotFound)?;
        Ok(InventoryItemUpdated {
            item_id: current.id,
            name,
            description,
        })
    }

    pub fn delete(&self) -> Result<InventoryItemDeleted, AggregateError> {
        let current = self.current.as_ref().ok_or(AggregateError::NotFound)?;
        Ok(InventoryItemDeleted {
            item_id: current.id,
            sku: current.sku.clone(),
        })
    }

    /// Validates a signed-delta adjustment against the same invariants
    /// the store's guarded UPDATE checks, so an infeasible adjustment is
    /// rejected here rather than surfacing only as a DLQ'd event later.
    pub fn adjust(&self, delta: i64) -> Result<StockAdjusted, AggregateError> {
        let current = self.current.as_ref().ok_or(AggregateError::NotFound)?;
        let new_quantity = current.quantity + delta;
        if new_quantity < 0 {
            return Err(AggregateError::Conflict("adjustment would make quantity negative".to_string()));
        }
        if new_quantity - current.reserved < 0 {
            return Err(AggregateError::Conflict("adjustment would drop quantity below reserved".to_string()));
        }
        Ok(StockAdjusted {
            item_id: current.id,
            sku: current.sku.clone(),
            adjustment: delta,
            previous_quantity: current.quantity,
            new_quantity,
        })
    }

    pub fn reserve(&self, amount: i64) -> Result<StockReserved, AggregateError> {
        let current = self.current.as_ref().ok_or(AggregateError::NotFound)?;
        if amount <= 0 {
            return Err(AggregateError::Validation("reserved quantity must be positive".to_string()));
        }
        let reserved_total = current.reserved + amount;
        if reserved_total > current.quantity {
            return Err(AggregateError::Conflict("insufficient available stock to reserve".to_string()));
        }
        Ok(StockReserved {
            item_id: current.id,
            sku: current.sku.clone(),
            reserved_quantity: amount,
            total_quantity: current.quantity,
            reserved_total,
            available_quantity: current.quantity - reserved_total,
        })
    }

    pub fn release(&self, amount: i64) -> Result<StockReleased, AggregateError> {
        let current = self.current.as_ref().ok_or(AggregateError::NotFound)?;
        if amount <= 0 {
            return Err(AggregateError::Validation("released quantity must be positive".to_string()));
        }
        if amount > current.reserved {
            return Err(AggregateError::Conflict("cannot release more than is reserved".to_string()));
        }
        let reserved_total = current.reserved - amount;
        Ok(StockReleased {
            item_id: current.id,
            sku: current.sku.clone(),
            released_quantity: amount,
            total_quantity: current.quantity,
            reserved_total,
            available_quantity: current.quantity - reserved_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_item() -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            sku: "SKU-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            quantity: 100,
            reserved: 20,
            available: 80,
            version: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn loaded(item: InventoryItem) -> InventoryAggregate {
        InventoryAggregate { current: Some(item) }
    }

    #[test]
    fn create_rejects_negative_quantity() {
        let aggregate = InventoryAggregate::new_unloaded();
        let result = aggregate.create("SKU-002".to_string(), "Mouse".to_string(), None, -1);
        assert!(matches!(result, Err(AggregateError::Validation(_))));
    }

    #[test]
    fn create_produces_event_with_fresh_id() {
        let aggregate = InventoryAggregate::new_unloaded();
        let (id, event) = aggregate.create("SKU-002".to_string(), "Mouse".to_string(), None, 50).unwrap();
        assert_eq!(event.item_id, id);
        assert_eq!(event.quantity, 50);
    }

    #[test]
    fn reserve_over_available_is_a_conflict() {
        let aggregate = loaded(sample_item());
        let result = aggregate.reserve(200);
        assert!(matches!(result, Err(AggregateError::Conflict(_))));
    }

    #[test]
    fn reserve_within_available_succeeds() {
        let aggregate = loaded(sample_item());
        let event = aggregate.reserve(30).unwrap();
        assert_eq!(event.reserved_total, 50);
        assert_eq!(event.available_quantity, 50);
    }

    #[test]
    fn release_more_than_reserved_is_a_conflict() {
        let aggregate = loaded(sample_item());
        let result = aggregate.release(100);
        assert!(matches!(result, Err(AggregateError::Conflict(_))));
    }

    #[test]
    fn adjust_below_reserved_is_a_conflict() {
        let aggregate = loaded(sample_item());
        let result = aggregate.adjust(-90);
        assert!(matches!(result, Err(AggregateError::Conflict(_))));
    }

    #[test]
    fn adjust_computes_new_quantity_from_current_row() {
        let aggregate = loaded(sample_item());
        let event = aggregate.adjust(25).unwrap();
        assert_eq!(event.previous_quantity, 100);
        assert_eq!(event.new_quantity, 125);
    }
}
