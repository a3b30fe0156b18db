//! IP geolocation for lead intake.
//!
//! Resolves city/country from a public IP address via an HTTP provider,
//! with a fallback provider and a 24-hour in-memory cache. Private,
//! loopback, and link-local addresses short-circuit to an empty location
//! without any outbound call, and every provider failure degrades to an
//! empty location - geo data is never worth failing a lead over.

mod config;
mod provider;
mod service;

pub use config::GeoIpConfig;
pub use provider::{GeoError, GeoProvider, HttpGeoProvider};
pub use service::GeoService;
