use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub http_timeout: Duration,
    pub http_cache: bool,
    pub initial_driver: Option<String>,
    pub initial_rival: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Duration::from_secs(10),
            http_cache: true,
            initial_driver: None,
            initial_rival: None,
        }
    }
}

impl AppConfig {
    /// Reads `F1_*` variables. Call after dotenvy has loaded `.env` files.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_base = lookup("F1_API_BASE")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or(defaults.api_base);
        let http_timeout = lookup("F1_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.clamp(1, 120)))
            .unwrap_or(defaults.http_timeout);
        let http_cache = lookup("F1_HTTP_CACHE")
            .map(|val| !matches!(val.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(defaults.http_cache);
        Self {
            api_base,
            http_timeout,
            http_cache,
            initial_driver: non_empty(lookup("F1_DRIVER")),
            initial_rival: non_empty(lookup("F1_RIVAL")),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
