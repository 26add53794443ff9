use crate::envelope::{Event, EventEnvelope, RawEnvelope};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOPIC_ITEMS: &str = "inventory.items";
const TOPIC_STOCK: &str = "inventory.stock";

macro_rules! impl_event {
    ($ty:ty, topic = $topic:expr, name = $name:expr, id = $id_field:ident) => {
        impl Event for $ty {
            const TOPIC: &'static str = $topic;

            fn event_type(&self) -> &'static str {
                $name
            }

            fn aggregate_id(&self) -> Option<String> {
                Some(self.$id_field.to_string())
            }
        }
    };
}

// ===== Item-lifecycle events (topic: inventory.items) =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemCreated {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
}
impl_event!(InventoryItemCreated, topic = TOPIC_ITEMS, name = "InventoryItemCreated", id = item_id);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemUpdated {
    pub item_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}
impl_event!(InventoryItemUpdated, topic = TOPIC_ITEMS, name = "InventoryItemUpdated", id = item_id);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemDeleted {
    pub item_id: Uuid,
    pub sku: String,
}
impl_event!(InventoryItemDeleted, topic = TOPIC_ITEMS, name = "InventoryItemDeleted", id = item_id);

// ===== Stock events (topic: inventory.stock) =====

/// `adjustment` is a signed delta, not a new total — see spec §9's Open
/// Question. `previous_quantity`/`new_quantity` are advisory only; the
/// applier recomputes both from the row it loads and ignores these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjusted {
    pub item_id: Uuid,
    pub sku: String,
    pub adjustment: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
}
impl_event!(StockAdjusted, topic = TOPIC_STOCK, name = "StockAdjusted", id = item_id);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockReserved {
    pub item_id: Uuid,
    pub sku: String,
    pub reserved_quantity: i64,
    pub total_quantity: i64,
    pub reserved_total: i64,
    pub available_quantity: i64,
}
impl_event!(StockReserved, topic = TOPIC_STOCK, name = "StockReserved", id = item_id);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockReleased {
    pub item_id: Uuid,
    pub sku: String,
    pub released_quantity: i64,
    pub total_quantity: i64,
    pub reserved_total: i64,
    pub available_quantity: i64,
}
impl_event!(StockReleased, topic = TOPIC_STOCK, name = "StockReleased", id = item_id);

// ===== Confirmed mirrors, published by the applier after a successful apply =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemCreatedConfirmed {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub version: i64,
}
impl_event!(
    InventoryItemCreatedConfirmed,
    topic = TOPIC_ITEMS,
    name = "InventoryItemCreatedConfirmed",
    id = item_id
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemUpdatedConfirmed {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub version: i64,
}
impl_event!(
    InventoryItemUpdatedConfirmed,
    topic = TOPIC_ITEMS,
    name = "InventoryItemUpdatedConfirmed",
    id = item_id
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemDeletedConfirmed {
    pub item_id: Uuid,
    pub sku: String,
}
impl_event!(
    InventoryItemDeletedConfirmed,
    topic = TOPIC_ITEMS,
    name = "InventoryItemDeletedConfirmed",
    id = item_id
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustedConfirmed {
    pub item_id: Uuid,
    pub sku: String,
    pub adjustment: i64,
    pub new_quantity: i64,
    pub reserved_total: i64,
    pub available_quantity: i64,
    pub version: i64,
}
impl_event!(StockAdjustedConfirmed, topic = TOPIC_STOCK, name = "StockAdjustedConfirmed", id = item_id);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockReservedConfirmed {
    pub item_id: Uuid,
    pub sku: String,
    pub reserved_quantity: i64,
    pub total_quantity: i64,
    pub reserved_total: i64,
    pub available_quantity: i64,
    pub version: i64,
}
impl_event!(StockReservedConfirmed, topic = TOPIC_STOCK, name = "StockReservedConfirmed", id = item_id);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockReleasedConfirmed {
    pub item_id: Uuid,
    pub sku: String,
    pub released_quantity: i64,
    pub total_quantity: i64,
    pub reserved_total: i64,
    pub available_quantity: i64,
    pub version: i64,
}
impl_event!(StockReleasedConfirmed, topic = TOPIC_STOCK, name = "StockReleasedConfirmed", id = item_id);

/// Tagged union over every event variant the applier understands.
///
/// Replaces what the source did with a runtime type-switch on a string:
/// here the `eventType` header picks a Rust variant at decode time, and
/// the compiler guarantees the applier's `match` is exhaustive.
#[derive(Debug, Clone)]
pub enum InventoryEvent {
    ItemCreated(EventEnvelope<InventoryItemCreated>),
    ItemUpdated(EventEnvelope<InventoryItemUpdated>),
    ItemDeleted(EventEnvelope<InventoryItemDeleted>),
    StockAdjusted(EventEnvelope<StockAdjusted>),
    StockReserved(EventEnvelope<StockReserved>),
    StockReleased(EventEnvelope<StockReleased>),
    /// Any `*Confirmed` event. The applier ignores these (see DESIGN.md's
    /// resolution of the confirmation-cycle open question); the cache
    /// coherence worker is the one consumer that cares, so the raw body
    /// is kept around rather than discarded at decode time.
    Confirmed {
        event_type: String,
        event_id: String,
        aggregate_id: String,
        data: serde_json::Value,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed envelope JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

impl InventoryEvent {
    pub fn event_id(&self) -> &str {
        match self {
            InventoryEvent::ItemCreated(e) => &e.event_id,
            InventoryEvent::ItemUpdated(e) => &e.event_id,
            InventoryEvent::ItemDeleted(e) => &e.event_id,
            InventoryEvent::StockAdjusted(e) => &e.event_id,
            InventoryEvent::StockReserved(e) => &e.event_id,
            InventoryEvent::StockReleased(e) => &e.event_id,
            InventoryEvent::Confirmed { event_id, .. } => event_id,
        }
    }

    /// Best-effort `sku` extraction from a Confirmed event's body, used by
    /// the cache coherence worker to target `item:sku:*` without knowing
    /// each Confirmed variant's exact shape (spec §4.7).
    pub fn confirmed_sku(&self) -> Option<&str> {
        match self {
            InventoryEvent::Confirmed { data, .. } => data.get("sku").and_then(|v| v.as_str()),
            _ => None,
        }
    }

    pub fn aggregate_id(&self) -> Option<&str> {
        match self {
            InventoryEvent::ItemCreated(e) => Some(&e.aggregate_id),
            InventoryEvent::ItemUpdated(e) => Some(&e.aggregate_id),
            InventoryEvent::ItemDeleted(e) => Some(&e.aggregate_id),
            InventoryEvent::StockAdjusted(e) => Some(&e.aggregate_id),
            InventoryEvent::StockReserved(e) => Some(&e.aggregate_id),
            InventoryEvent::StockReleased(e) => Some(&e.aggregate_id),
            InventoryEvent::Confirmed { aggregate_id, .. } => Some(aggregate_id),
        }
    }

    /// Decode a raw envelope once the `event-type` header identifies the
    /// variant. Callers are expected to have already skipped messages
    /// missing that header — see the consumer pipeline, step 1.
    pub fn decode(event_type: &str, raw: RawEnvelope) -> Result<Self, DecodeError> {
        if event_type.ends_with("Confirmed") {
            return Ok(InventoryEvent::Confirmed {
                event_type: event_type.to_string(),
                event_id: raw.event_id,
                aggregate_id: raw.aggregate_id,
                data: raw.data,
            });
        }

        macro_rules! parse_as {
            ($ty:ty) => {
                serde_json::from_value::<$ty>(raw.data.clone())
                    .map(|data| EventEnvelope {
                        event_type: raw.event_type.clone(),
                        event_id: raw.event_id.clone(),
                        aggregate_id: raw.aggregate_id.clone(),
                        occurred_at: raw.occurred_at,
                        version: raw.version,
                        data,
                    })?
            };
        }

        Ok(match event_type {
            "InventoryItemCreated" => InventoryEvent::ItemCreated(parse_as!(InventoryItemCreated)),
            "InventoryItemUpdated" => InventoryEvent::ItemUpdated(parse_as!(InventoryItemUpdated)),
            "InventoryItemDeleted" => InventoryEvent::ItemDeleted(parse_as!(InventoryItemDeleted)),
            "StockAdjusted" => InventoryEvent::StockAdjusted(parse_as!(StockAdjusted)),
            "StockReserved" => InventoryEvent::StockReserved(parse_as!(StockReserved)),
            "StockReleased" => InventoryEvent::StockReleased(parse_as!(StockReleased)),
            other => return Err(DecodeError::UnknownEventType(other.to_string())),
        })
    }
}

/// Pure function from event kind to topic, per spec §4.1: item-lifecycle
/// kinds route to the items topic, stock kinds to the stock topic.
pub fn topic_for_event_type(event_type: &str) -> Option<&'static str> {
    match event_type {
        "InventoryItemCreated" | "InventoryItemUpdated" | "InventoryItemDeleted"
        | "InventoryItemCreatedConfirmed" | "InventoryItemUpdatedConfirmed" | "InventoryItemDeletedConfirmed" => {
            Some(TOPIC_ITEMS)
        }
        "StockAdjusted" | "StockReserved" | "StockReleased" | "StockAdjustedConfirmed" | "StockReservedConfirmed"
        | "StockReleasedConfirmed" => Some(TOPIC_STOCK),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_events_route_to_items_topic() {
        assert_eq!(topic_for_event_type("InventoryItemCreated"), Some(TOPIC_ITEMS));
        assert_eq!(topic_for_event_type("InventoryItemDeletedConfirmed"), Some(TOPIC_ITEMS));
    }

    #[test]
    fn stock_events_route_to_stock_topic() {
        assert_eq!(topic_for_event_type("StockAdjusted"), Some(TOPIC_STOCK));
        assert_eq!(topic_for_event_type("StockReservedConfirmed"), Some(TOPIC_STOCK));
    }

    #[test]
    fn unknown_event_type_has_no_route() {
        assert_eq!(topic_for_event_type("SomethingElse"), None);
    }

    #[test]
    fn decode_dispatches_stock_adjusted_by_event_type() {
        let raw = RawEnvelope {
            event_type: "StockAdjusted".to_string(),
            event_id: "e1".to_string(),
            aggregate_id: "a1".to_string(),
            occurred_at: chrono::Utc::now(),
            version: 1,
            data: serde_json::json!({
                "itemId": "22222222-2222-2222-2222-222222222222",
                "sku": "SKU-001",
                "adjustment": 25,
                "previousQuantity": 100,
                "newQuantity": 125
            }),
        };
        let event = InventoryEvent::decode("StockAdjusted", raw).expect("decodes");
        match event {
            InventoryEvent::StockAdjusted(envelope) => assert_eq!(envelope.data.adjustment, 25),
            other => panic!("expected StockAdjusted, got {other:?}"),
        }
    }

    #[test]
    fn decode_recognizes_confirmed_events_without_parsing_data() {
        let raw = RawEnvelope {
            event_type: "StockAdjustedConfirmed".to_string(),
            event_id: "e2".to_string(),
            aggregate_id: "a1".to_string(),
            occurred_at: chrono::Utc::now(),
            version: 1,
            data: serde_json::json!({"anything": "goes"}),
        };
        let event = InventoryEvent::decode("StockAdjustedConfirmed", raw).expect("decodes");
        assert!(matches!(event, InventoryEvent::Confirmed { .. }));
    }

    #[test]
    fn decode_rejects_unknown_event_type() {
        let raw = RawEnvelope {
            event_type: "SomethingWeird".to_string(),
            event_id: "e3".to_string(),
            aggregate_id: "a1".to_string(),
            occurred_at: chrono::Utc::now(),
            version: 1,
            data: serde_json::json!({}),
        };
        assert!(InventoryEvent::decode("SomethingWeird", raw).is_err());
    }
}
