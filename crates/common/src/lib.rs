pub mod config;
pub mod consumer;
pub mod dlq;
pub mod envelope;
pub mod error;
pub mod events;
pub mod model;
pub mod producer;

pub use config::{HttpSettings, Settings};
pub use consumer::{ConsumerGroupRuntime, EventHandler};
pub use dlq::DlqRecord;
pub use envelope::{Event, EventEnvelope, RawEnvelope};
pub use error::{ApiError, AppError, ErrorBody};
pub use events::{topic_for_event_type, DecodeError, InventoryEvent};
pub use model::{InventoryItem, StockStatus};
pub use producer::{EventPublisher, IdempotentProducer, PublishOutcome};
