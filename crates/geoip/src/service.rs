//! The caching, fallback-aware geolocation service.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use intake_core::{GeoLocation, Geolocator};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::GeoIpConfig;
use crate::provider::{GeoError, GeoProvider, HttpGeoProvider};

struct CacheEntry {
    location: GeoLocation,
    stored_at: Instant,
}

/// Geolocation service: private-range short-circuit, positive-result cache,
/// primary provider with optional fallback, failures swallowed.
pub struct GeoService<P: GeoProvider> {
    primary: P,
    fallback: Option<P>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl GeoService<HttpGeoProvider> {
    /// Build the HTTP-backed service from configuration.
    pub fn from_config(config: &GeoIpConfig) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let primary = HttpGeoProvider::new(client.clone(), &config.primary_url, "primary");
        let fallback = config
            .fallback_url
            .as_ref()
            .map(|url| HttpGeoProvider::new(client, url, "fallback"));

        Ok(Self::new(primary, fallback, Duration::from_secs(config.cache_ttl_secs)))
    }
}

impl<P: GeoProvider> GeoService<P> {
    /// Create a service over explicit providers.
    pub fn new(primary: P, fallback: Option<P>, ttl: Duration) -> Self {
        Self {
            primary,
            fallback,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn cached(&self, ip: &str) -> Option<GeoLocation> {
        let mut cache = self.cache.lock().expect("geo cache poisoned");
        match cache.get(ip) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                Some(entry.location.clone())
            }
            Some(_) => {
                cache.remove(ip);
                None
            }
            None => None,
        }
    }

    fn store(&self, ip: &str, location: &GeoLocation) {
        let mut cache = self.cache.lock().expect("geo cache poisoned");
        cache.insert(
            ip.to_string(),
            CacheEntry {
                location: location.clone(),
                stored_at: Instant::now(),
            },
        );
    }

    async fn resolve(&self, ip: &str) -> GeoLocation {
        match self.primary.lookup(ip).await {
            Ok(location) => {
                self.store(ip, &location);
                return location;
            }
            Err(err) => {
                warn!(provider = %self.primary.name(), %ip, error = %err, "Geo lookup failed");
            }
        }

        let Some(fallback) = &self.fallback else {
            return GeoLocation::empty();
        };

        match fallback.lookup(ip).await {
            Ok(location) => {
                self.store(ip, &location);
                location
            }
            Err(err) => {
                warn!(provider = %fallback.name(), %ip, error = %err, "Geo fallback failed");
                GeoLocation::empty()
            }
        }
    }
}

#[async_trait]
impl<P: GeoProvider> Geolocator for GeoService<P> {
    async fn locate(&self, ip: &str) -> GeoLocation {
        let ip = ip.trim();
        if ip.is_empty() {
            return GeoLocation::empty();
        }

        let addr: IpAddr = match ip.parse() {
            Ok(addr) => addr,
            Err(_) => {
                debug!(%ip, "Unparseable IP, skipping geo lookup");
                return GeoLocation::empty();
            }
        };

        if is_private_or_reserved(&addr) {
            return GeoLocation::empty();
        }

        if let Some(hit) = self.cached(ip) {
            debug!(%ip, "Geo cache hit");
            return hit;
        }

        self.resolve(ip).await
    }
}

/// Addresses that never reach a provider: loopback, private ranges,
/// link-local, and unspecified, for both IPv4 and IPv6.
fn is_private_or_reserved(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let seg0 = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (seg0 & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (seg0 & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider that counts lookups.
    struct FakeProvider {
        result: Option<GeoLocation>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn returning(city: &str, country: &str) -> Self {
            Self {
                result: Some(GeoLocation {
                    city: Some(city.to_string()),
                    country: Some(country.to_string()),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoProvider for FakeProvider {
        async fn lookup(&self, ip: &str) -> Result<GeoLocation, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| GeoError::Unsuccessful { ip: ip.to_string() })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn day() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    #[tokio::test]
    async fn test_private_ips_never_reach_provider() {
        let service = GeoService::new(FakeProvider::returning("X", "Y"), None, day());

        for ip in [
            "127.0.0.1",
            "10.0.0.5",
            "192.168.1.1",
            "172.16.0.1",
            "169.254.0.1",
            "0.0.0.0",
            "::1",
            "fe80::1",
            "fd12:3456::1",
            "",
            "not-an-ip",
        ] {
            assert_eq!(service.locate(ip).await, GeoLocation::empty(), "ip: {ip}");
        }
        assert_eq!(service.primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_positive_result_served_from_cache() {
        let service = GeoService::new(FakeProvider::returning("Berlin", "Germany"), None, day());

        let first = service.locate("93.184.216.34").await;
        assert_eq!(first.city.as_deref(), Some("Berlin"));

        let second = service.locate("93.184.216.34").await;
        assert_eq!(second, first);
        assert_eq!(service.primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_entry_triggers_fresh_lookup() {
        let service = GeoService::new(
            FakeProvider::returning("Oslo", "Norway"),
            None,
            Duration::ZERO,
        );

        service.locate("93.184.216.34").await;
        service.locate("93.184.216.34").await;
        assert_eq!(service.primary.calls(), 2);
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_fails() {
        let service = GeoService::new(
            FakeProvider::failing(),
            Some(FakeProvider::returning("Lima", "Peru")),
            day(),
        );

        let location = service.locate("93.184.216.34").await;
        assert_eq!(location.country.as_deref(), Some("Peru"));
        assert_eq!(service.primary.calls(), 1);
        assert_eq!(service.fallback.as_ref().unwrap().calls(), 1);
    }

    #[tokio::test]
    async fn test_all_failures_degrade_to_empty() {
        let service = GeoService::new(
            FakeProvider::failing(),
            Some(FakeProvider::failing()),
            day(),
        );

        assert_eq!(service.locate("93.184.216.34").await, GeoLocation::empty());
    }
}
