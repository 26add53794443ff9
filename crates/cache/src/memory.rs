use crate::error::CacheError;
use crate::trait_def::Cache;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Fallback cache used when `use_cache=false` or the Redis client fails
/// to connect at startup, see spec §4.7. A `dashmap` keeps entries
/// sharded for concurrent access without a global lock; expiry is
/// checked lazily on read rather than via a background sweep.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.entries.get(key) {
            Some(entry) if entry.1 > Instant::now() => Ok(Some(entry.0.clone())),
            Some(_) => {
                drop(self.entries.remove(key));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        let count = matching.len() as u64;
        for key in matching {
            self.entries.remove(&key);
        }
        Ok(count)
    }
}

/// Minimal glob matcher supporting `*` as "match anything". Sufficient
/// for the fixed key-family patterns this crate generates
/// (`item:id:*`, `items:list:*`, ...); not a general shell-glob.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut cursor = 0usize;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !text[cursor..].starts_with(part) {
                return false;
            }
            cursor += part.len();
        } else if i == parts.len() - 1 {
            return text[cursor..].ends_with(part);
        } else {
            match text[cursor..].find(part) {
                Some(pos) => cursor += pos + part.len(),
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = InMemoryCache::new();
        cache.set("item:id:1", "payload".to_string(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("item:id:1").await.unwrap(), Some("payload".to_string()));
    }

    #[tokio::test]
    async fn expired_entries_read_as_miss() {
        let cache = InMemoryCache::new();
        cache.set("stock:1", "payload".to_string(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("stock:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_by_pattern_removes_matching_keys_only() {
        let cache = InMemoryCache::new();
        cache.set("item:id:1", "a".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.set("item:id:2", "b".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.set("stock:1", "c".to_string(), Duration::from_secs(60)).await.unwrap();

        let deleted = cache.delete_by_pattern("item:id:*").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(cache.get("stock:1").await.unwrap(), Some("c".to_string()));
    }

    #[test]
    fn glob_match_handles_prefix_patterns() {
        assert!(glob_match("item:id:*", "item:id:123"));
        assert!(!glob_match("item:id:*", "item:sku:123"));
        assert!(glob_match("items:list:*", "items:list:1:20"));
    }
}
