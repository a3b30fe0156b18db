//! Geo lookup result type.

use serde::{Deserialize, Serialize};

/// City/country resolved from an IP address.
///
/// Either field may be absent when the provider omits it; both are absent
/// for private addresses and failed lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl GeoLocation {
    /// A location with neither city nor country.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when neither field is set.
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.country.is_none()
    }
}
