use axum::body::Bytes;
use axum::http::StatusCode;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// The collaborator spec §1 calls "request-ID middleware and in-memory
/// idempotency cache": a repeated `X-Request-ID` within the TTL window
/// replays the cached response instead of re-invoking the aggregate, so a
/// client that times out waiting for a publish-failure 503 (spec §4.6) can
/// safely retry with the same header.
#[derive(Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Default)]
pub struct IdempotencyCache {
    entries: DashMap<String, (CachedResponse, Instant)>,
}

impl IdempotencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, request_id: &str) -> Option<CachedResponse> {
        match self.entries.get(request_id) {
            Some(entry) if entry.1 > Instant::now() => Some(entry.0.clone()),
            Some(_) => {
                drop(self.entries.remove(request_id));
                None
            }
            None => None,
        }
    }

    /// Only successful responses are worth replaying — a failed attempt
    /// should be retried for real on the next request with the same id,
    /// not replayed as a cached failure.
    pub fn set_if_success(&self, request_id: &str, response: CachedResponse, ttl: Duration) {
        if response.status.is_success() {
            self.entries.insert(request_id.to_string(), (response, Instant::now() + ttl));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_cached_success_within_ttl() {
        let cache = IdempotencyCache::new();
        let response = CachedResponse {
            status: StatusCode::CREATED,
            body: Bytes::from_static(b"{}"),
        };
        cache.set_if_success("req-1", response, Duration::from_secs(60));
        assert!(cache.get("req-1").is_some());
    }

    #[test]
    fn does_not_cache_failed_responses() {
        let cache = IdempotencyCache::new();
        let response = CachedResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: Bytes::from_static(b"{}"),
        };
        cache.set_if_success("req-2", response, Duration::from_secs(60));
        assert!(cache.get("req-2").is_none());
    }

    #[test]
    fn expired_entries_are_not_replayed() {
        let cache = IdempotencyCache::new();
        let response = CachedResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(b"{}"),
        };
        cache.set_if_success("req-3", response, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("req-3").is_none());
    }
}
