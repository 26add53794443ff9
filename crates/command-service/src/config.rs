use common::{HttpSettings, Settings};

/// Command-service-specific config layered on top of the shared `common::Settings`,
/// mirroring the teacher's single `AppConfig::from_env()` but split so the
/// write-side's bearer secret and idempotency TTL don't leak into `common`,
/// which is shared by all three services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub http: HttpSettings,
    /// Static shared-secret bearer token. Stands in for the JWT credential
    /// check spec §1 names as an out-of-scope collaborator.
    pub bearer_token: String,
    /// TTL for the `X-Request-ID` idempotency cache, spec §1/§4.6.
    pub idempotency_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            settings: Settings::from_env("command-service"),
            http: HttpSettings::from_env("COMMAND_SERVICE_PORT", 8081),
            bearer_token: std::env::var("COMMAND_BEARER_TOKEN").unwrap_or_else(|_| "dev-secret".to_string()),
            idempotency_ttl_secs: std::env::var("IDEMPOTENCY_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}
