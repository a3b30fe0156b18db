//! Configuration for the geolocation client.

use std::env;

/// Default primary provider endpoint.
pub const DEFAULT_PRIMARY_URL: &str = "http://ip-api.com/json";

/// Default fallback provider endpoint.
pub const DEFAULT_FALLBACK_URL: &str = "https://ipwho.is";

/// Configuration for the geolocation client.
#[derive(Debug, Clone)]
pub struct GeoIpConfig {
    /// Primary provider base URL; the IP is appended as a path segment.
    pub primary_url: String,

    /// Fallback provider base URL, tried when the primary fails.
    /// `None` disables the fallback.
    pub fallback_url: Option<String>,

    /// HTTP timeout per provider call, in seconds.
    pub timeout_secs: u64,

    /// How long a positive lookup result stays cached, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_url: Some(DEFAULT_FALLBACK_URL.to_string()),
            timeout_secs: 5,
            cache_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl GeoIpConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOIP_PRIMARY_URL` | Primary provider base URL | `http://ip-api.com/json` |
    /// | `GEOIP_FALLBACK_URL` | Fallback provider base URL (empty disables) | `https://ipwho.is` |
    /// | `GEOIP_TIMEOUT_SECS` | Per-call HTTP timeout | `5` |
    /// | `GEOIP_CACHE_TTL_SECS` | Positive-result cache TTL | `86400` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let primary_url =
            env::var("GEOIP_PRIMARY_URL").unwrap_or(defaults.primary_url);

        let fallback_url = match env::var("GEOIP_FALLBACK_URL") {
            Ok(url) if url.is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => defaults.fallback_url,
        };

        let timeout_secs = env::var("GEOIP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let cache_ttl_secs = env::var("GEOIP_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        Self {
            primary_url,
            fallback_url,
            timeout_secs,
            cache_ttl_secs,
        }
    }
}
