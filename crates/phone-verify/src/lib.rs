//! Phone verification gate for lead intake.
//!
//! Leads carrying a phone number must have a usable verification record
//! before they are persisted. The gate consults the newest record for the
//! phone; when it is absent or expired, a synchronous provider lookup runs
//! and its result is persisted as a new record. Without provider
//! credentials the gate is disabled and passes everything through.

mod config;
mod gate;
mod provider;

pub use config::PhoneVerifyConfig;
pub use gate::VerificationGate;
pub use provider::{HttpLookupProvider, LookupError, LookupOutcome, LookupProvider};
