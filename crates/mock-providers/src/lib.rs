//! Mock implementations of the intake guard traits.
//!
//! These fakes stand in for the `geoip` and `phone-verify` crates in
//! pipeline and API tests: deterministic, no network, with call counters
//! so tests can assert how often the pipeline consulted them.

mod geolocator;
mod verifier;

pub use geolocator::MockGeolocator;
pub use verifier::{MockPhoneVerifier, MockVerdict};
