// BulkMailVerifier single-email client
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::{ProviderError, VerificationProvider};
use crate::config::ProviderConfig;
use crate::email::types::VerificationStatus;

const PROVIDER: &str = "bulkmailverifier";

/// Simple GET-per-address API. Batch verification walks the list; a failed
/// address becomes `Unknown` and the walk continues.
#[derive(Clone)]
pub struct BulkMailVerifierClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BulkMailVerifierClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.bulkmail_base_url.trim_end_matches('/').to_string(),
            api_key: config.bulkmail_api_key.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(PROVIDER.to_string()))
    }

    /// Status plus the raw provider payload, for the endpoint that exposes
    /// provider-specific fields alongside the mapped status.
    pub async fn verify_email_detailed(
        &self,
        email: &str,
    ) -> Result<(VerificationStatus, Value), ProviderError> {
        let key = self.api_key()?;
        let url = format!("{}/checkEmail", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("email", email), ("key", key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;

        let mapped = map_status(body.get("status").and_then(Value::as_str).unwrap_or_default());
        Ok((mapped, body))
    }
}

#[async_trait]
impl VerificationProvider for BulkMailVerifierClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn verify_email(&self, email: &str) -> Result<VerificationStatus, ProviderError> {
        let (status, _) = self.verify_email_detailed(email).await?;
        Ok(status)
    }

    async fn verify_emails(
        &self,
        emails: &[String],
    ) -> Result<HashMap<String, VerificationStatus>, ProviderError> {
        // Credential check up front so a misconfigured key fails the batch
        // once instead of once per address.
        self.api_key()?;

        let mut results = HashMap::with_capacity(emails.len());
        for email in emails {
            let status = match self.verify_email(email).await {
                Ok(status) => status,
                Err(e) if e.is_not_configured() => return Err(e),
                Err(e) => {
                    tracing::warn!("{} failed for {}: {}", PROVIDER, email, e);
                    VerificationStatus::Unknown
                }
            };
            results.insert(email.clone(), status);
        }
        Ok(results)
    }
}

/// Provider status strings arrive in assorted spellings ("Catch-All",
/// "catch_all"). Normalize punctuation before matching.
fn map_status(raw: &str) -> VerificationStatus {
    let normalized: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match normalized.as_str() {
        "valid" | "ok" | "deliverable" | "passed" => VerificationStatus::Valid,
        "invalid" | "undeliverable" | "bad" | "failed" => VerificationStatus::Invalid,
        "catchall" | "acceptall" => VerificationStatus::Catchall,
        _ => VerificationStatus::Unknown,
    }
}
