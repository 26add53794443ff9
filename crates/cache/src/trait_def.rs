use crate::error::CacheError;
use std::future::Future;
use std::time::Duration;

/// Read-through cache contract, see spec §4.7. RPITIT, mirroring the
/// teacher's `message_bus::EventBus` shape, so a backend swap never
/// requires boxing the future.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;

    fn set(&self, key: &str, value: String, ttl: Duration) -> impl Future<Output = Result<(), CacheError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, CacheError>> + Send;

    /// Deletes every key matching `pattern` (a glob, e.g. `items:list:*`).
    /// Implementations MUST iterate with a cursor rather than loading
    /// the whole keyspace at once (spec §4.7: "MUST iterate with a
    /// cursor/scan ... allowed to run in batches").
    fn delete_by_pattern(&self, pattern: &str) -> impl Future<Output = Result<u64, CacheError>> + Send;
}
