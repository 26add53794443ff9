use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Implemented by every concrete domain event payload that can travel on
/// the bus. Mirrors the teacher's `Event` trait, minus the runtime
/// `std::any::type_name` lookup: `event_type()` returns the wire-format
/// `eventType` explicitly (PascalCase) instead of deriving it from the
/// Rust type name, so renaming a Rust struct never silently changes the
/// wire contract.
pub trait Event: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + std::fmt::Debug + 'static {
    /// Kafka topic this event kind is routed to.
    const TOPIC: &'static str;

    /// Wire-format `eventType`, e.g. `"InventoryItemCreated"`.
    fn event_type(&self) -> &'static str;

    /// Aggregate id used as the Kafka partition key. `None` is rejected
    /// at produce time — every inventory event carries an aggregate id.
    fn aggregate_id(&self) -> Option<String>;
}

/// Canonical wire envelope, see spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<T> {
    pub event_type: String,
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub version: u32,
    pub data: T,
}

impl<T> EventEnvelope<T>
where
    T: Event,
{
    /// Builds an envelope for an event that carries its own aggregate id.
    /// Returns `None` if the event has no aggregate id — callers must
    /// reject the publish rather than produce an unroutable message.
    pub fn new(data: T) -> Option<Self> {
        let aggregate_id = data.aggregate_id()?;
        Some(Self {
            event_type: data.event_type().to_string(),
            event_id: uuid::Uuid::new_v4().to_string(),
            aggregate_id,
            occurred_at: chrono::Utc::now(),
            version: 1,
            data,
        })
    }

    /// Kafka message headers: `event-type`, `event-id`, `timestamp`.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::with_capacity(3);
        headers.insert("event-type".to_string(), self.event_type.clone());
        headers.insert("event-id".to_string(), self.event_id.clone());
        headers.insert("timestamp".to_string(), self.occurred_at.to_rfc3339());
        headers
    }
}

/// Envelope shape decoded before the concrete event type is known: `data`
/// is left as a generic JSON value until the `event-type` header tells the
/// consumer which struct to parse it into. A message missing that header
/// is never decoded this way — the consumer pipeline skips it before
/// reaching this type. See `events::InventoryEvent::decode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvelope {
    pub event_type: String,
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub version: u32,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InventoryItemCreated;

    #[test]
    fn envelope_round_trips_through_json() {
        let event = InventoryItemCreated {
            item_id: uuid::Uuid::new_v4(),
            sku: "SKU-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            quantity: 100,
        };
        let envelope = EventEnvelope::new(event).expect("has aggregate id");

        let json = serde_json::to_string(&envelope).expect("serialize");
        let back: EventEnvelope<InventoryItemCreated> =
            serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.event_type, "InventoryItemCreated");
        assert_eq!(back.aggregate_id, envelope.aggregate_id);
    }

    #[test]
    fn unknown_top_level_fields_are_ignored_on_decode() {
        let json = r#"{
            "eventType": "InventoryItemCreated",
            "eventId": "11111111-1111-1111-1111-111111111111",
            "aggregateId": "22222222-2222-2222-2222-222222222222",
            "occurredAt": "2026-01-01T00:00:00Z",
            "version": 1,
            "futureField": "should be dropped",
            "data": {
                "itemId": "22222222-2222-2222-2222-222222222222",
                "sku": "SKU-001",
                "name": "Laptop",
                "quantity": 100
            }
        }"#;
        let envelope: EventEnvelope<InventoryItemCreated> =
            serde_json::from_str(json).expect("decode should ignore unknown fields");
        assert_eq!(envelope.event_type, "InventoryItemCreated");
    }
}
