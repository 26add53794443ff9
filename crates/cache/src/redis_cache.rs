use crate::error::CacheError;
use crate::trait_def::Cache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed cache, see spec §4.7 and §5 ("pooled client, 10
/// connections, 5 idle; safe for concurrent use"). `ConnectionManager`
/// handles reconnection transparently and is `Clone + Send + Sync`, the
/// same building block `proerror77-Nova`'s `cache-invalidation` library
/// uses for its Redis pub/sub connections.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(|e| CacheError::Backend(e.to_string()))?;
        let conn = ConnectionManager::new(client).await.map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(|e| CacheError::Backend(e.to_string()))
    }

    /// Iterates with `SCAN` in batches rather than `KEYS`, per spec §4.7
    /// — `KEYS` blocks the Redis event loop on a large keyspace, `SCAN`
    /// doesn't.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted = 0u64;

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Backend(e.to_string()))?;

            if !batch.is_empty() {
                let removed: u64 = conn.del(&batch).await.map_err(|e| CacheError::Backend(e.to_string()))?;
                deleted += removed;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }
}
