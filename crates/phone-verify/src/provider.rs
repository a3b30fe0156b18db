//! Verification provider abstraction and the HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors from a single provider lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport or deserialization failure.
    #[error("verification lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result of a provider lookup.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    /// Whether the provider reported a completed lookup.
    pub completed: bool,
    /// Raw provider response, persisted with the verification record.
    pub raw: Value,
}

/// A phone verification lookup backend.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Look up a phone number with the provider.
    async fn lookup(&self, phone: &str) -> Result<LookupOutcome, LookupError>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: Option<String>,
    #[serde(flatten)]
    rest: Value,
}

/// HTTP verification provider: `GET {base_url}/{phone}` with a bearer
/// token, answering `{"status": "completed", ...}` for verified numbers.
pub struct HttpLookupProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpLookupProvider {
    /// Create a provider against the given base URL and API key.
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl LookupProvider for HttpLookupProvider {
    async fn lookup(&self, phone: &str) -> Result<LookupOutcome, LookupError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), phone);
        debug!(%phone, "Phone verification lookup");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json::<LookupResponse>()
            .await?;

        let completed = response.status.as_deref() == Some("completed");
        let mut raw = response.rest;
        if let (Value::Object(map), Some(status)) = (&mut raw, response.status) {
            map.insert("status".to_string(), Value::String(status));
        }

        Ok(LookupOutcome { completed, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_status_detection() {
        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"completed","carrier":"acme"}"#).unwrap();
        assert_eq!(response.status.as_deref(), Some("completed"));

        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"undeliverable"}"#).unwrap();
        assert_eq!(response.status.as_deref(), Some("undeliverable"));

        let response: LookupResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.status.is_none());
    }
}
