//! The Geolocator trait definition.

use async_trait::async_trait;

use crate::location::GeoLocation;

/// A trait for resolving city/country from an IP address.
///
/// Geo-enrichment is strictly best-effort: implementations swallow their
/// own lookup failures and return an empty location instead of an error.
/// This trait is object-safe and can be used with `Box<dyn Geolocator>`.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Resolve the location for an IP address.
    ///
    /// Returns an empty [`GeoLocation`] for private/loopback addresses,
    /// unparseable input, and any provider failure.
    async fn locate(&self, ip: &str) -> GeoLocation;
}
