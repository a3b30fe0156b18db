//! A scripted geolocator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use intake_core::{async_trait, GeoLocation, Geolocator};

/// A geolocator answering from a fixed ip -> location table.
///
/// Unknown IPs resolve to an empty location, mirroring the degrade-to-
/// nothing contract of the real service.
#[derive(Default)]
pub struct MockGeolocator {
    locations: Mutex<HashMap<String, GeoLocation>>,
    calls: AtomicUsize,
}

impl MockGeolocator {
    /// Create an empty mock; every lookup resolves to an empty location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a location for an IP.
    pub fn with_location(self, ip: &str, city: &str, country: &str) -> Self {
        self.locations.lock().unwrap().insert(
            ip.to_string(),
            GeoLocation {
                city: Some(city.to_string()),
                country: Some(country.to_string()),
            },
        );
        self
    }

    /// Number of lookups performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocator for MockGeolocator {
    async fn locate(&self, ip: &str) -> GeoLocation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.locations
            .lock()
            .unwrap()
            .get(ip)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_lookup() {
        let geo = MockGeolocator::new().with_location("1.2.3.4", "Lisbon", "Portugal");

        let hit = geo.locate("1.2.3.4").await;
        assert_eq!(hit.city.as_deref(), Some("Lisbon"));

        let miss = geo.locate("9.9.9.9").await;
        assert!(miss.is_empty());

        assert_eq!(geo.calls(), 2);
    }
}
