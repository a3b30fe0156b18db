//! Core traits and types for lead intake guard implementations.
//!
//! This crate provides the seams the intake pipeline depends on:
//!
//! - [`Geolocator`] - resolves city/country from an IP address
//! - [`PhoneVerifier`] - gates intake on phone verification
//! - [`GeoLocation`] - the (possibly partial) result of a geo lookup
//! - [`VerifyError`] - failures a phone verifier can surface
//!
//! Implementations live in the `geoip` and `phone-verify` crates; test
//! fakes live in `mock-providers`.
//!
//! # Example
//!
//! ```rust
//! use intake_core::{async_trait, GeoLocation, Geolocator};
//!
//! struct FixedGeolocator;
//!
//! #[async_trait]
//! impl Geolocator for FixedGeolocator {
//!     async fn locate(&self, _ip: &str) -> GeoLocation {
//!         GeoLocation {
//!             city: Some("Lisbon".to_string()),
//!             country: Some("Portugal".to_string()),
//!         }
//!     }
//! }
//! ```

mod error;
mod geolocator;
mod location;
mod verifier;

pub use error::VerifyError;
pub use geolocator::Geolocator;
pub use location::GeoLocation;
pub use verifier::PhoneVerifier;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
