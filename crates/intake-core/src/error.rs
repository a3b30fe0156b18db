//! Error types for phone verification.

use thiserror::Error;

/// Errors a phone verifier can surface.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The phone has no usable verification after resolution.
    #[error("phone not verified: {phone}")]
    NotVerified { phone: String },

    /// The verification provider call failed outright.
    #[error("verification provider error: {0}")]
    Provider(String),

    /// Persisting or reading a verification record failed.
    #[error("verification storage error: {0}")]
    Storage(String),
}
