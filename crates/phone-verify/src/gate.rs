//! The verification gate consulted by the intake pipeline.

use std::time::Duration;

use async_trait::async_trait;
use database::{phone_verification, DatabaseError, VerificationStatus};
use intake_core::{PhoneVerifier, VerifyError};
use reqwest::Client;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::config::PhoneVerifyConfig;
use crate::provider::{HttpLookupProvider, LookupProvider};

/// Phone verification gate.
///
/// Holds an optional provider; without one the gate is disabled and every
/// phone passes. Verification records are persisted through the shared
/// database pool so repeated submissions reuse earlier results.
pub struct VerificationGate<P: LookupProvider> {
    pool: SqlitePool,
    provider: Option<P>,
    verified_ttl_minutes: u32,
}

impl VerificationGate<HttpLookupProvider> {
    /// Build the HTTP-backed gate from configuration. Missing credentials
    /// produce a disabled gate, not an error.
    pub fn from_config(pool: SqlitePool, config: &PhoneVerifyConfig) -> Result<Self, VerifyError> {
        let provider = match (&config.api_url, &config.api_key) {
            (Some(url), Some(key)) => {
                let client = Client::builder()
                    .timeout(Duration::from_secs(config.timeout_secs))
                    .build()
                    .map_err(|e| VerifyError::Provider(e.to_string()))?;
                Some(HttpLookupProvider::new(client, url, key))
            }
            _ => {
                info!("Phone verification gate disabled (no provider credentials)");
                None
            }
        };

        Ok(Self::new(pool, provider, config.verified_ttl_minutes))
    }
}

impl<P: LookupProvider> VerificationGate<P> {
    /// Create a gate over an explicit provider. `None` disables the gate.
    pub fn new(pool: SqlitePool, provider: Option<P>, verified_ttl_minutes: u32) -> Self {
        Self {
            pool,
            provider,
            verified_ttl_minutes,
        }
    }

    /// Run a provider lookup and persist its result as a new record.
    ///
    /// Failed lookups are stored with a zero TTL so the next submission
    /// retries the provider instead of being stuck behind a stale failure.
    async fn refresh(&self, provider: &P, phone: &str) -> Result<(), VerifyError> {
        let outcome = provider
            .lookup(phone)
            .await
            .map_err(|e| VerifyError::Provider(e.to_string()))?;

        let (status, ttl) = if outcome.completed {
            (VerificationStatus::Verified, Some(self.verified_ttl_minutes))
        } else {
            (VerificationStatus::Failed, Some(0))
        };

        phone_verification::insert_verification(&self.pool, phone, status, ttl, Some(&outcome.raw))
            .await
            .map_err(storage)?;

        debug!(%phone, ?status, "Verification record persisted");
        Ok(())
    }
}

#[async_trait]
impl<P: LookupProvider> PhoneVerifier for VerificationGate<P> {
    async fn ensure_verified(&self, phone: &str) -> Result<(), VerifyError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Ok(());
        }
        let Some(provider) = &self.provider else {
            return Ok(());
        };

        let latest = phone_verification::latest_for_phone(&self.pool, phone)
            .await
            .map_err(storage)?;

        let needs_lookup = match &latest {
            None => true,
            Some(record) => phone_verification::is_expired(&self.pool, record.id)
                .await
                .map_err(storage)?,
        };

        if needs_lookup {
            self.refresh(provider, phone).await?;
        }

        if phone_verification::has_usable_verification(&self.pool, phone)
            .await
            .map_err(storage)?
        {
            Ok(())
        } else {
            Err(VerifyError::NotVerified {
                phone: phone.to_string(),
            })
        }
    }

    async fn attach_lead(&self, lead_id: i64, phone: &str) {
        let phone = phone.trim();
        if phone.is_empty() {
            return;
        }

        let result = async {
            let record = phone_verification::latest_unlinked_for_phone(&self.pool, phone).await?;
            if let Some(record) = record {
                phone_verification::link_to_lead(&self.pool, record.id, lead_id).await?;
                debug!(lead_id, verification_id = record.id, "Verification attached to lead");
            }
            Ok::<_, DatabaseError>(())
        }
        .await;

        if let Err(err) = result {
            warn!(lead_id, %phone, error = %err, "Failed to attach verification to lead");
        }
    }

    fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }
}

fn storage(err: DatabaseError) -> VerifyError {
    VerifyError::Storage(err.to_string())
}
