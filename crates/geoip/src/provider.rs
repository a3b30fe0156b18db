//! Geolocation provider abstraction and the HTTP implementation.

use async_trait::async_trait;
use intake_core::GeoLocation;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors internal to a single provider lookup.
///
/// These never cross the [`intake_core::Geolocator`] boundary; the service
/// layer swallows them after exhausting the fallback.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Transport or deserialization failure.
    #[error("geo lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but reported a non-success status.
    #[error("geo provider reported failure for {ip}")]
    Unsuccessful { ip: String },
}

/// A single geolocation lookup backend.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Look up the location for a public IP address.
    async fn lookup(&self, ip: &str) -> Result<GeoLocation, GeoError>;

    /// Human-readable provider name for logging.
    fn name(&self) -> &str;
}

/// Response body shared by the supported providers.
///
/// ip-api.com signals success via `status: "success"`; ipwho.is via
/// `success: true`. Both carry plain `city`/`country` fields.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    status: Option<String>,
    success: Option<bool>,
    city: Option<String>,
    country: Option<String>,
}

impl ProviderResponse {
    fn is_success(&self) -> bool {
        match (&self.status, self.success) {
            (Some(status), _) => status == "success",
            (None, Some(success)) => success,
            // No status field at all: treat a 200 with location data as success.
            (None, None) => self.city.is_some() || self.country.is_some(),
        }
    }
}

/// HTTP geolocation provider. The IP is appended to the base URL as a
/// path segment: `GET {base_url}/{ip}`.
pub struct HttpGeoProvider {
    client: Client,
    base_url: String,
    name: String,
}

impl HttpGeoProvider {
    /// Create a provider against the given base URL.
    pub fn new(client: Client, base_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl GeoProvider for HttpGeoProvider {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), ip);
        debug!(provider = %self.name, %ip, "Geo lookup");

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<ProviderResponse>()
            .await?;

        if !response.is_success() {
            return Err(GeoError::Unsuccessful { ip: ip.to_string() });
        }

        Ok(GeoLocation {
            city: response.city.filter(|c| !c.is_empty()),
            country: response.country.filter(|c| !c.is_empty()),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
