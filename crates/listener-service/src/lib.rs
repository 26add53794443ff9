use applier::EventApplier;
use common::{ConsumerGroupRuntime, EventHandler, IdempotentProducer, Settings};
use std::sync::Arc;
use std::time::Duration;
use store::InventoryStore;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The Listener Service, spec §1/§4.3: consumer-group runtime → applier →
/// SQLite → Confirmed producer. Shaped after the teacher's `KafkaService`
/// (config → consumer/producer wiring → `run`/`shutdown`) but generalized
/// from "one topic in, one topic out" to the retry/DLQ pipeline spec §4.3
/// specifies, with the applier owning the single-writer store instead of
/// a stateless webhook-to-AI transform.
pub struct ListenerService {
    runtime: Arc<ConsumerGroupRuntime>,
    applier: Arc<dyn EventHandler>,
    producer: Arc<IdempotentProducer>,
    cancel: CancellationToken,
}

impl ListenerService {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = Settings::from_env("listener-service");
        info!(sqlite_path = %settings.sqlite_path, group_id = %settings.group_id, "listener-service configuration loaded");

        let store = InventoryStore::connect(&settings.sqlite_path).await?;
        let producer = Arc::new(IdempotentProducer::new(&settings.brokers, &settings.acks, settings.retries)?);
        let cancel = CancellationToken::new();
        let applier: Arc<dyn EventHandler> = Arc::new(EventApplier::new(store, producer.clone(), cancel.clone()));

        let runtime = Arc::new(ConsumerGroupRuntime::new(
            &settings.brokers,
            &settings.group_id,
            &[settings.topic_items.as_str(), settings.topic_stock.as_str()],
            settings.max_retries,
            settings.retry_delay_ms,
            settings.dead_letter_queue,
            settings.dlq_topic.clone(),
        )?);

        Ok(Self {
            runtime,
            applier,
            producer,
            cancel,
        })
    }

    /// Runs the consumer-group pipeline until `shutdown` cancels it.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.runtime.run(self.applier.clone(), self.producer.clone(), self.cancel.clone()).await?;
        Ok(())
    }

    /// Cancels the root token (spec §5: in-flight apply finishes, offset
    /// commits, consumer leaves the group) and flushes the producer so no
    /// Confirmed event is lost mid-flight.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.cancel.cancel();
        self.producer.flush(Duration::from_secs(5))?;
        Ok(())
    }
}
