use crate::dlq::DlqRecord;
use crate::envelope::RawEnvelope;
use crate::error::AppError;
use crate::events::InventoryEvent;
use crate::producer::IdempotentProducer;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, ConsumerContext, Rebalance, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Headers, Message, OwnedHeaders};
use rdkafka::{ClientContext, TopicPartitionList};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Applies one decoded event to the store. Implemented by
/// `applier::EventApplier` (the Listener) and by the cache-coherence
/// worker (the Query service) for the Confirmed stream.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: InventoryEvent) -> Result<(), AppError>;
}

/// Logs rebalances, mirroring the teacher's `MessageConsumerContext`.
/// Partitions are only revoked between `recv()` calls in the loop below
/// (the runtime never starts a new poll until the in-flight message's
/// offset has been marked), so "outstanding applies complete before
/// revoke" (spec §4.3) holds without extra synchronization here.
pub struct LoggingConsumerContext;

impl ClientContext for LoggingConsumerContext {}
impl ConsumerContext for LoggingConsumerContext {
    fn pre_rebalance(&self, rebalance: &Rebalance) {
        info!(?rebalance, "consumer group rebalance starting");
    }

    fn post_rebalance(&self, rebalance: &Rebalance) {
        info!(?rebalance, "consumer group rebalance complete");
    }

    fn commit_callback(&self, result: rdkafka::error::KafkaResult<()>, offsets: &TopicPartitionList) {
        if let Err(e) = result {
            error!(error = %e, ?offsets, "offset commit failed");
        }
    }
}

/// Consumer-group runtime, see spec §4.3. One instance per service,
/// subscribed to a fixed topic set, manual-commit discipline throughout.
pub struct ConsumerGroupRuntime {
    consumer: StreamConsumer<LoggingConsumerContext>,
    max_retries: u32,
    retry_delay_ms: u64,
    dlq_enabled: bool,
    dlq_topic: String,
}

impl ConsumerGroupRuntime {
    pub fn new(
        brokers: &str,
        group_id: &str,
        topics: &[&str],
        max_retries: u32,
        retry_delay_ms: u64,
        dlq_enabled: bool,
        dlq_topic: impl Into<String>,
    ) -> Result<Self, AppError> {
        let consumer: StreamConsumer<LoggingConsumerContext> = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .set("heartbeat.interval.ms", "3000")
            .set("max.poll.interval.ms", "300000")
            .create_with_context(LoggingConsumerContext)
            .map_err(|e| AppError::Fatal(format!("failed to create Kafka consumer: {e}")))?;

        consumer
            .subscribe(topics)
            .map_err(|e| AppError::Fatal(format!("failed to subscribe to {topics:?}: {e}")))?;

        Ok(Self {
            consumer,
            max_retries,
            retry_delay_ms,
            dlq_enabled,
            dlq_topic: dlq_topic.into(),
        })
    }

    /// Runs the per-message pipeline from spec §4.3 until `cancel` fires.
    pub async fn run(
        &self,
        handler: Arc<dyn EventHandler>,
        producer: Arc<IdempotentProducer>,
        cancel: CancellationToken,
    ) -> Result<(), AppError> {
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("consumer runtime shutting down");
                    return Ok(());
                }
                recv = self.consumer.recv() => recv,
            };

            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    error!(error = %e, "error receiving message, backing off");
                    tokio::time::sleep(Duration::from_millis(1000)).await;
                    continue;
                }
            };

            // Step 1: extract event-type header.
            let event_type = message
                .headers()
                .and_then(|headers| headers.iter().find(|h| h.key == "event-type"))
                .and_then(|h| h.value)
                .and_then(|v| std::str::from_utf8(v).ok())
                .map(str::to_string);

            let Some(event_type) = event_type else {
                warn!("message missing event-type header, skipping");
                self.mark_offset(&message);
                continue;
            };

            let payload = message.payload().unwrap_or_default().to_vec();
            let key = message.key().map(|k| k.to_vec()).unwrap_or_default();
            let headers = message.headers().map(owned_headers_from);

            // Step 2: decode envelope.
            let raw: RawEnvelope = match serde_json::from_slice(&payload) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "malformed envelope, routing to DLQ");
                    self.dlq_if_enabled(&producer, &message, &key, &payload, headers, &format!("malformed envelope: {e}"))
                        .await;
                    self.mark_offset(&message);
                    continue;
                }
            };

            let event = match InventoryEvent::decode(&event_type, raw) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "undecodable event body, routing to DLQ");
                    self.dlq_if_enabled(&producer, &message, &key, &payload, headers, &e.to_string()).await;
                    self.mark_offset(&message);
                    continue;
                }
            };

            // Step 3: attempt loop, up to max_retries+1 invocations, linear backoff.
            let mut last_error = None;
            for attempt in 0..=self.max_retries {
                if attempt > 0 {
                    let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                match handler.handle(event.clone()).await {
                    Ok(()) => {
                        last_error = None;
                        break;
                    }
                    Err(e) => {
                        let retryable = e.is_retryable();
                        warn!(event_id = event.event_id(), attempt, error = %e, retryable, "apply failed");
                        last_error = Some(e);
                        if !retryable {
                            break;
                        }
                    }
                }
            }

            // Step 4: terminal failure — either a non-retryable error or
            // retries exhausted while still retryable. Either way the
            // message cannot be applied; route to DLQ if enabled.
            if let Some(error) = last_error {
                self.dlq_if_enabled(&producer, &message, &key, &payload, headers, &error.to_string()).await;
            }

            self.mark_offset(&message);
        }
    }

    async fn dlq_if_enabled(
        &self,
        producer: &IdempotentProducer,
        message: &BorrowedMessage<'_>,
        key: &[u8],
        payload: &[u8],
        headers: Option<OwnedHeaders>,
        reason: &str,
    ) {
        let header_map: HashMap<String, String> = message
            .headers()
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|h| Some((h.key.to_string(), String::from_utf8_lossy(h.value?).to_string())))
                    .collect()
            })
            .unwrap_or_default();
        let now = chrono::Utc::now();
        let record = DlqRecord {
            original_topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            headers: header_map,
            value: payload.to_vec(),
            error: reason.to_string(),
            first_attempted_at: now,
            last_attempted_at: now,
        };

        if !self.dlq_enabled {
            warn!(?record, "DLQ disabled, dropping unprocessable message (operator must monitor logs)");
            return;
        }
        warn!(?record, "routing message to DLQ");

        let mut headers = headers.unwrap_or_else(OwnedHeaders::new);
        headers = headers.insert(rdkafka::message::Header {
            key: "dlq-reason",
            value: Some(reason),
        });
        let key = String::from_utf8_lossy(key).to_string();
        if let Err(e) = producer.publish_raw(&self.dlq_topic, &key, payload, headers).await {
            error!(error = %e, "failed to publish to DLQ, message will be dropped");
        }
    }

    fn mark_offset(&self, message: &rdkafka::message::BorrowedMessage<'_>) {
        if let Err(e) = self.consumer.commit_message(message, CommitMode::Async) {
            error!(error = %e, "failed to commit offset");
        }
    }
}

fn owned_headers_from(headers: &rdkafka::message::BorrowedHeaders) -> OwnedHeaders {
    let mut owned = OwnedHeaders::new();
    for header in headers.iter() {
        owned = owned.insert(rdkafka::message::Header {
            key: header.key,
            value: header.value,
        });
    }
    owned
}
