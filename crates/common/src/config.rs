use serde::Deserialize;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Settings shared by all three services, every key recognized per
/// spec §6's configuration table. Loaded the teacher's way
/// (`dotenv::dotenv().ok()` then `std::env::var(...)` with
/// `unwrap_or_else` defaults) rather than through a layered-file config
/// crate — the surface here is small and flat enough that a config
/// crate would be undergrounded ceremony.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub brokers: String,
    pub topic_items: String,
    pub topic_stock: String,
    pub dlq_topic: String,
    pub group_id: String,
    pub auto_commit: bool,
    pub acks: String,
    pub retries: u32,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub dead_letter_queue: bool,
    pub sqlite_path: String,
    pub cache_ttl_secs: u64,
    pub use_cache: bool,
    pub redis_url: Option<String>,
}

impl Settings {
    /// `group_id` has no sane cross-service default (spec §6 says "per
    /// service"), so callers pass it explicitly; everything else falls
    /// back to the defaults spec §6 lists.
    pub fn from_env(group_id: impl Into<String>) -> Self {
        dotenv::dotenv().ok();

        Self {
            brokers: env_or("KAFKA_BROKERS", "localhost:9092"),
            topic_items: env_or("TOPIC_ITEMS", "inventory.items"),
            topic_stock: env_or("TOPIC_STOCK", "inventory.stock"),
            dlq_topic: env_or("DLQ_TOPIC", "inventory.dlq"),
            group_id: group_id.into(),
            auto_commit: env_parse("AUTO_COMMIT", false),
            acks: env_or("ACKS", "all"),
            retries: env_parse("RETRIES", 3),
            max_retries: env_parse("MAX_RETRIES", 3),
            retry_delay_ms: env_parse("RETRY_DELAY_MS", 1000),
            dead_letter_queue: env_parse("DEAD_LETTER_QUEUE", true),
            sqlite_path: env_or("SQLITE_PATH", "./inventory.db"),
            cache_ttl_secs: env_parse("CACHE_TTL", 300),
            use_cache: env_parse("USE_CACHE", false),
            redis_url: std::env::var("REDIS_URL").ok(),
        }
    }

    pub fn bootstrap_servers(&self) -> Vec<&str> {
        self.brokers.split(',').map(str::trim).collect()
    }
}

/// HTTP listen settings, mirroring the teacher's `AppConfig::listen_address`.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl HttpSettings {
    pub fn from_env(port_key: &str, default_port: u16) -> Self {
        dotenv::dotenv().ok();
        Self {
            host: env_or("HTTP_HOST", "0.0.0.0"),
            port: env_parse(port_key, default_port),
        }
    }

    pub fn listen_address(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid HTTP host/port")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        for key in [
            "KAFKA_BROKERS",
            "TOPIC_ITEMS",
            "TOPIC_STOCK",
            "DLQ_TOPIC",
            "AUTO_COMMIT",
            "ACKS",
            "RETRIES",
            "MAX_RETRIES",
            "RETRY_DELAY_MS",
            "DEAD_LETTER_QUEUE",
            "SQLITE_PATH",
            "CACHE_TTL",
            "USE_CACHE",
        ] {
            unsafe {
                std::env::remove_var(key);
            }
        }

        let settings = Settings::from_env("test-group");
        assert_eq!(settings.brokers, "localhost:9092");
        assert_eq!(settings.topic_items, "inventory.items");
        assert_eq!(settings.topic_stock, "inventory.stock");
        assert_eq!(settings.dlq_topic, "inventory.dlq");
        assert_eq!(settings.acks, "all");
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.retry_delay_ms, 1000);
        assert!(settings.dead_letter_queue);
        assert_eq!(settings.sqlite_path, "./inventory.db");
        assert_eq!(settings.cache_ttl_secs, 300);
        assert!(!settings.use_cache);
    }
}
