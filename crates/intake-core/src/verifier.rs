//! The PhoneVerifier trait definition.

use async_trait::async_trait;

use crate::error::VerifyError;

/// A trait for gating lead intake on phone verification.
///
/// This trait is object-safe and can be used with `Box<dyn PhoneVerifier>`.
#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    /// Ensure the phone has a usable verification, performing a fresh
    /// provider lookup when the latest record is absent or expired.
    ///
    /// Implementations must treat an empty phone, and a disabled gate,
    /// as a silent pass.
    async fn ensure_verified(&self, phone: &str) -> Result<(), VerifyError>;

    /// Link the newest unlinked verification record for `phone` to the
    /// lead it gated. Best-effort: failures are logged, never propagated.
    async fn attach_lead(&self, lead_id: i64, phone: &str);

    /// Whether the gate is active (provider credentials configured).
    ///
    /// Default implementation reports an active gate.
    fn is_enabled(&self) -> bool {
        true
    }
}
