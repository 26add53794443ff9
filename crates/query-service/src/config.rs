use common::{HttpSettings, Settings};

/// Query-service-specific config layered on top of the shared
/// `common::Settings`, the same split command-service uses so the read
/// side's pagination defaults don't leak into `common`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub http: HttpSettings,
    /// Default `page_size` when the caller omits the query parameter,
    /// clamped the same way an explicit value is, spec §6.
    pub default_page_size: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            settings: Settings::from_env("query-service"),
            http: HttpSettings::from_env("QUERY_SERVICE_PORT", 8082),
            default_page_size: std::env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        }
    }
}
