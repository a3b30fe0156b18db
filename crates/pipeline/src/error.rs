//! Error types for the intake pipeline.

use std::fmt;

use database::DatabaseError;
use intake_core::VerifyError;
use thiserror::Error;

/// Which rate limiter rejected the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    /// Leads per user across all clients.
    GlobalUser,
    /// Leads per client fingerprint.
    ClientLeads,
    /// Distinct quizzes per client fingerprint.
    ClientQuizzes,
    /// Test leads per client fingerprint.
    TestLead,
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RateLimitScope::GlobalUser => "global-user",
            RateLimitScope::ClientLeads => "client-leads",
            RateLimitScope::ClientQuizzes => "client-quizzes",
            RateLimitScope::TestLead => "test-lead",
        };
        f.write_str(s)
    }
}

/// Errors that can terminate lead intake.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// A rate limiter rejected the submission.
    #[error("rate limit exceeded ({scope}): {limit} per {window_minutes} minutes")]
    RateLimitExceeded {
        scope: RateLimitScope,
        limit: i64,
        window_minutes: u32,
    },

    /// The phone has no usable verification.
    #[error("phone not verified: {phone}")]
    PhoneNotVerified { phone: String },

    /// The phone verification provider call failed.
    #[error("phone verification provider error: {0}")]
    PhoneVerificationProvider(String),

    /// A referenced user or quiz is missing or blocked.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Storage failure.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Anything else that should not happen per request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<VerifyError> for IntakeError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NotVerified { phone } => IntakeError::PhoneNotVerified { phone },
            VerifyError::Provider(msg) => IntakeError::PhoneVerificationProvider(msg),
            VerifyError::Storage(msg) => IntakeError::Internal(msg),
        }
    }
}
