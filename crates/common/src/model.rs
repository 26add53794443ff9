use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The aggregate/row, see spec §3. Carries the derived `available` field
/// so query reads never need to recompute it, but every write path
/// re-asserts `available = quantity - reserved` before committing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub reserved: i64,
    pub available: i64,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl InventoryItem {
    /// `true` when the four core invariants from spec §3 all hold.
    pub fn invariants_hold(&self) -> bool {
        self.quantity >= 0
            && self.reserved >= 0
            && self.quantity >= self.reserved
            && self.available == self.quantity - self.reserved
    }
}

/// Stock-status projection served by `GET /items/{id}/stock`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockStatus {
    pub item_id: Uuid,
    pub sku: String,
    pub quantity: i64,
    pub reserved: i64,
    pub available: i64,
    pub version: i64,
}

impl From<&InventoryItem> for StockStatus {
    fn from(item: &InventoryItem) -> Self {
        Self {
            item_id: item.id,
            sku: item.sku.clone(),
            quantity: item.quantity,
            reserved: item.reserved,
            available: item.available,
            version: item.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            sku: "SKU-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            quantity: 100,
            reserved: 20,
            available: 80,
            version: 3,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn invariants_hold_for_consistent_row() {
        assert!(sample().invariants_hold());
    }

    #[test]
    fn invariants_fail_when_available_is_stale() {
        let mut item = sample();
        item.available = 79;
        assert!(!item.invariants_hold());
    }

    #[test]
    fn invariants_fail_when_reserved_exceeds_quantity() {
        let mut item = sample();
        item.reserved = 150;
        assert!(!item.invariants_hold());
    }
}
