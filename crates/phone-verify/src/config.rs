//! Configuration for the phone verification gate.

use std::env;

/// Default validity horizon for a fresh verification, in minutes (30 days).
pub const DEFAULT_VERIFIED_TTL_MINUTES: u32 = 30 * 24 * 60;

/// Configuration for the phone verification gate.
///
/// The gate is enabled only when both the provider URL and API key are
/// configured; otherwise every phone passes through unverified.
#[derive(Debug, Clone)]
pub struct PhoneVerifyConfig {
    /// Provider base URL; the phone is appended as a path segment.
    pub api_url: Option<String>,

    /// Provider API key, sent as a bearer token.
    pub api_key: Option<String>,

    /// HTTP timeout per lookup, in seconds.
    pub timeout_secs: u64,

    /// How long a successful verification stays usable, in minutes.
    pub verified_ttl_minutes: u32,
}

impl Default for PhoneVerifyConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            timeout_secs: 5,
            verified_ttl_minutes: DEFAULT_VERIFIED_TTL_MINUTES,
        }
    }
}

impl PhoneVerifyConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PHONE_VERIFY_API_URL` | Provider base URL | (unset: gate disabled) |
    /// | `PHONE_VERIFY_API_KEY` | Provider API key | (unset: gate disabled) |
    /// | `PHONE_VERIFY_TIMEOUT_SECS` | Per-call HTTP timeout | `5` |
    /// | `PHONE_VERIFY_TTL_MINUTES` | Verification validity horizon | `43200` (30 days) |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_url: env::var("PHONE_VERIFY_API_URL").ok().filter(|v| !v.is_empty()),
            api_key: env::var("PHONE_VERIFY_API_KEY").ok().filter(|v| !v.is_empty()),
            timeout_secs: env::var("PHONE_VERIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            verified_ttl_minutes: env::var("PHONE_VERIFY_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.verified_ttl_minutes),
        }
    }

    /// Whether the gate has everything it needs to call the provider.
    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }
}
