use crate::config::AppConfig;
use cache::{Cache, CacheError, InMemoryCache, RedisCache};
use std::sync::Arc;
use std::time::Duration;
use store::InventoryStore;
use tracing::{info, warn};

/// Picks one cache backend at startup and erases the choice behind a
/// single type so `AppState` stays `Clone` without boxing every call
/// (the `Cache` trait is RPITIT, so it can't be used as `dyn Cache`).
/// Mirrors the shape of the teacher's own `enum`-over-client pattern for
/// "one of several concrete backends behind a shared state field".
#[derive(Clone)]
pub enum AnyCache {
    Redis(RedisCache),
    Memory(Arc<InMemoryCache>),
}

impl AnyCache {
    /// `use_cache=false`, a missing `REDIS_URL`, or a failed connection
    /// attempt all fall back to the in-memory cache, see spec §4.7.
    pub async fn from_settings(use_cache: bool, redis_url: Option<&str>) -> Self {
        if use_cache {
            if let Some(url) = redis_url {
                match RedisCache::connect(url).await {
                    Ok(redis) => {
                        info!("connected to Redis cache backend");
                        return AnyCache::Redis(redis);
                    }
                    Err(e) => warn!(error = %e, "failed to connect to Redis, falling back to in-memory cache"),
                }
            } else {
                warn!("USE_CACHE is set but REDIS_URL is missing, falling back to in-memory cache");
            }
        }
        AnyCache::Memory(Arc::new(InMemoryCache::new()))
    }
}

impl Cache for AnyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            AnyCache::Redis(c) => c.get(key).await,
            AnyCache::Memory(c) => c.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        match self {
            AnyCache::Redis(c) => c.set(key, value, ttl).await,
            AnyCache::Memory(c) => c.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            AnyCache::Redis(c) => c.delete(key).await,
            AnyCache::Memory(c) => c.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        match self {
            AnyCache::Redis(c) => c.exists(key).await,
            AnyCache::Memory(c) => c.exists(key).await,
        }
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        match self {
            AnyCache::Redis(c) => c.delete_by_pattern(pattern).await,
            AnyCache::Memory(c) => c.delete_by_pattern(pattern).await,
        }
    }
}

/// Shared state for the query-service's axum app.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: InventoryStore,
    pub cache: AnyCache,
    pub cache_ttl: Duration,
    /// TTL for the `stock:<uuid>` family, half of `cache_ttl` per spec
    /// §4.7 — stock churns fastest of the four key families.
    pub stock_ttl: Duration,
}
