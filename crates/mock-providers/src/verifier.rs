//! A scripted phone verifier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use intake_core::{async_trait, PhoneVerifier, VerifyError};

/// What the mock verifier should do with every phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockVerdict {
    /// Every phone passes.
    Pass,
    /// Every phone is rejected as unverified.
    Reject,
    /// Every lookup fails at the provider.
    ProviderDown,
}

/// A phone verifier with a single scripted verdict.
pub struct MockPhoneVerifier {
    verdict: MockVerdict,
    enabled: bool,
    calls: AtomicUsize,
    attached: Mutex<Vec<(i64, String)>>,
}

impl MockPhoneVerifier {
    /// A verifier that passes every phone.
    pub fn passing() -> Self {
        Self::with_verdict(MockVerdict::Pass)
    }

    /// A verifier that rejects every phone as unverified.
    pub fn rejecting() -> Self {
        Self::with_verdict(MockVerdict::Reject)
    }

    /// A verifier whose provider is unreachable.
    pub fn provider_down() -> Self {
        Self::with_verdict(MockVerdict::ProviderDown)
    }

    /// A disabled gate: passes everything, reports `is_enabled() == false`.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::with_verdict(MockVerdict::Pass)
        }
    }

    fn with_verdict(verdict: MockVerdict) -> Self {
        Self {
            verdict,
            enabled: true,
            calls: AtomicUsize::new(0),
            attached: Mutex::new(Vec::new()),
        }
    }

    /// Number of `ensure_verified` calls that reached the verifier.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (lead_id, phone) pairs passed to `attach_lead`.
    pub fn attached(&self) -> Vec<(i64, String)> {
        self.attached.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhoneVerifier for MockPhoneVerifier {
    async fn ensure_verified(&self, phone: &str) -> Result<(), VerifyError> {
        if phone.trim().is_empty() || !self.enabled {
            return Ok(());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.verdict {
            MockVerdict::Pass => Ok(()),
            MockVerdict::Reject => Err(VerifyError::NotVerified {
                phone: phone.to_string(),
            }),
            MockVerdict::ProviderDown => {
                Err(VerifyError::Provider("mock provider down".to_string()))
            }
        }
    }

    async fn attach_lead(&self, lead_id: i64, phone: &str) {
        self.attached
            .lock()
            .unwrap()
            .push((lead_id, phone.to_string()));
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
