use crate::envelope::{Event, EventEnvelope};
use crate::error::AppError;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const BASE_BACKOFF_MS: u64 = 100;
const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Idempotent, ordered publisher — see spec §4.2.
///
/// Built the way the teacher's `kafka_bus.rs`/`producer.rs` build their
/// `FutureProducer`s (`acks=all`, `enable.idempotence=true`, zstd
/// compression) but with `max.in.flight.requests.per.connection` pinned
/// to 1, which the teacher never needed (its producer never retries
/// application-side) and this spec requires to keep retries from
/// reordering messages on the same partition.
pub struct IdempotentProducer {
    producer: FutureProducer,
    max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Ok,
}

impl IdempotentProducer {
    pub fn new(brokers: &str, acks: &str, max_attempts: u32) -> Result<Self, AppError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", acks)
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "1")
            .set("compression.type", "zstd")
            .set("linger.ms", "5")
            .create()
            .map_err(|e| AppError::Fatal(format!("failed to create Kafka producer: {e}")))?;

        Ok(Self {
            producer,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Publish a single event, honoring the retry contract of spec §4.2:
    /// up to `max_attempts` tries, exponential backoff starting at
    /// 100ms and doubling, each attempt bounded by a 5s timeout. Honors
    /// `cancel` both between attempts and during the backoff wait.
    pub async fn publish<T: Event>(&self, event: T, topic_override: Option<&str>, cancel: &CancellationToken) -> Result<PublishOutcome, AppError> {
        let envelope = EventEnvelope::new(event)
            .ok_or_else(|| AppError::Fatal("event has no aggregate id; cannot route to a partition".to_string()))?;
        self.publish_envelope(envelope, topic_override, cancel).await
    }

    pub async fn publish_envelope<T: Event>(
        &self,
        envelope: EventEnvelope<T>,
        topic_override: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PublishOutcome, AppError> {
        let topic = topic_override.unwrap_or(T::TOPIC);
        let payload = serde_json::to_string(&envelope)
            .map_err(|e| AppError::Fatal(format!("failed to serialize event {}: {e}", envelope.event_id)))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(event_id = %envelope.event_id, %topic, attempt, "publishing event");

            let record = FutureRecord::to(topic).key(&envelope.aggregate_id).payload(&payload);

            let send = self.producer.send(record, Timeout::After(PER_ATTEMPT_TIMEOUT));
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(AppError::Transient("publish cancelled by shutdown".to_string()));
                }
                result = send => match result {
                    Ok(_delivery) => return Ok(PublishOutcome::Ok),
                    Err((kafka_error, _owned_message)) => {
                        if !kafka_error.is_retriable() || attempt >= self.max_attempts {
                            error!(event_id = %envelope.event_id, error = %kafka_error, "publish failed, giving up");
                            return Err(AppError::Transient(format!("kafka send failed after {attempt} attempts: {kafka_error}")));
                        }
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt - 1));
                        warn!(event_id = %envelope.event_id, error = %kafka_error, attempt, ?backoff, "publish failed, retrying");
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                return Err(AppError::Transient("publish cancelled during backoff".to_string()));
                            }
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            }
        }
    }

    /// Publish raw bytes with explicit headers — used by the DLQ path,
    /// which must forward the original message byte-for-byte (spec §8
    /// property 7) rather than re-encode a typed event.
    pub async fn publish_raw(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        headers: rdkafka::message::OwnedHeaders,
    ) -> Result<PublishOutcome, AppError> {
        let record = FutureRecord::to(topic).key(key).payload(payload).headers(headers);
        match self.producer.send(record, Timeout::After(PER_ATTEMPT_TIMEOUT)).await {
            Ok(_) => Ok(PublishOutcome::Ok),
            Err((kafka_error, _)) => Err(AppError::Transient(format!("DLQ publish failed: {kafka_error}"))),
        }
    }

    /// Flush pending messages before shutdown, see spec §5.
    pub fn flush(&self, timeout: Duration) -> Result<(), AppError> {
        self.producer
            .flush(timeout)
            .map_err(|e| AppError::Transient(format!("producer flush failed: {e}")))
    }
}

/// Generalizes over "something that can publish a typed event", the way
/// the teacher's `message_bus::EventBus` generalizes its Kafka-backed
/// publisher — same return-position-`impl Future` shape, so a test
/// double can implement it without pulling in `rdkafka` or a running
/// broker.
pub trait EventPublisher: Send + Sync {
    fn publish_event<T: Event>(
        &self,
        event: T,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<PublishOutcome, AppError>> + Send;
}

impl EventPublisher for IdempotentProducer {
    async fn publish_event<T: Event>(&self, event: T, cancel: &CancellationToken) -> Result<PublishOutcome, AppError> {
        self.publish(event, None, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let delays: Vec<u64> = (1..=4).map(|attempt| BASE_BACKOFF_MS * 2u64.pow(attempt - 1)).collect();
        assert_eq!(delays, vec![100, 200, 400, 800]);
    }
}
