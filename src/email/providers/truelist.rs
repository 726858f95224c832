// Truelist batch verification client
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::{ProviderError, VerificationProvider};
use crate::config::ProviderConfig;
use crate::email::types::VerificationStatus;

const PROVIDER: &str = "truelist";

/// Batch-oriented client: submit all addresses in one call, then poll the
/// batch until the provider finishes. Polling has a hard deadline; hitting
/// it is a `PollDeadline` error, which callers treat as "no result".
#[derive(Clone)]
pub struct TruelistClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
    poll_deadline: Duration,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    emails: Vec<BatchEmail>,
}

#[derive(Debug, Deserialize)]
struct BatchEmail {
    address: String,
    #[serde(default)]
    email_state: Option<String>,
    #[serde(default)]
    email_sub_state: Option<String>,
}

impl TruelistClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.truelist_base_url.trim_end_matches('/').to_string(),
            api_key: config.truelist_api_key.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_deadline: Duration::from_millis(config.poll_deadline_ms),
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(PROVIDER.to_string()))
    }

    async fn submit_batch(&self, emails: &[String]) -> Result<String, ProviderError> {
        let key = self.api_key()?;
        let url = format!("{}/api/v1/batches", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&serde_json::json!({ "emails": emails }))
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

        let batch: BatchResponse = response.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;
        Ok(batch.id)
    }

    async fn poll_batch(&self, batch_id: &str) -> Result<Vec<BatchEmail>, ProviderError> {
        let key = self.api_key()?;
        let url = format!("{}/api/v1/batches/{}", self.base_url, batch_id);
        let deadline = Instant::now() + self.poll_deadline;

        loop {
            let response = self.client.get(&url).bearer_auth(key).send().await?;
            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    provider: PROVIDER.to_string(),
                    status: status.as_u16(),
                    message,
                });
            }

            let batch: BatchResponse = response.json().await.map_err(|e| ProviderError::Decode {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

            if matches!(batch.status.as_deref(), Some("completed") | Some("finished")) {
                return Ok(batch.emails);
            }

            if Instant::now() + self.poll_interval >= deadline {
                return Err(ProviderError::PollDeadline(PROVIDER.to_string()));
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl VerificationProvider for TruelistClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn verify_email(&self, email: &str) -> Result<VerificationStatus, ProviderError> {
        let emails = vec![email.to_string()];
        let results = self.verify_emails(&emails).await?;
        Ok(results.get(email).copied().unwrap_or(VerificationStatus::Unknown))
    }

    async fn verify_emails(
        &self,
        emails: &[String],
    ) -> Result<HashMap<String, VerificationStatus>, ProviderError> {
        if emails.is_empty() {
            return Ok(HashMap::new());
        }

        let batch_id = self.submit_batch(emails).await?;
        let results = self.poll_batch(&batch_id).await?;

        let mut mapped: HashMap<String, VerificationStatus> = results
            .into_iter()
            .map(|e| {
                let status = map_email_state(e.email_state.as_deref(), e.email_sub_state.as_deref());
                (e.address, status)
            })
            .collect();

        // Addresses the provider dropped from its response count as unknown.
        for email in emails {
            mapped.entry(email.clone()).or_insert(VerificationStatus::Unknown);
        }
        Ok(mapped)
    }
}

/// Truelist reports `email_state` with a finer `email_sub_state`. Only the
/// combinations below are conclusive; everything else is unknown.
fn map_email_state(state: Option<&str>, sub_state: Option<&str>) -> VerificationStatus {
    match state.unwrap_or_default() {
        "ok" => VerificationStatus::Valid,
        "risky" => match sub_state.unwrap_or_default() {
            "accept_all" | "catch_all" => VerificationStatus::Catchall,
            _ => VerificationStatus::Unknown,
        },
        "invalid" | "undeliverable" | "failed" => VerificationStatus::Invalid,
        _ => VerificationStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_email_state() {
        assert_eq!(map_email_state(Some("ok"), None), VerificationStatus::Valid);
        assert_eq!(map_email_state(Some("ok"), Some("deliverable")), VerificationStatus::Valid);
        assert_eq!(
            map_email_state(Some("risky"), Some("accept_all")),
            VerificationStatus::Catchall
        );
        assert_eq!(map_email_state(Some("risky"), Some("role")), VerificationStatus::Unknown);
        assert_eq!(map_email_state(Some("invalid"), None), VerificationStatus::Invalid);
        assert_eq!(map_email_state(Some("undeliverable"), None), VerificationStatus::Invalid);
        assert_eq!(map_email_state(None, None), VerificationStatus::Unknown);
        assert_eq!(map_email_state(Some("weird"), Some("weird")), VerificationStatus::Unknown);
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let config = crate::config::AppConfig::from_env().providers;
        let client = TruelistClient::new(reqwest::Client::new(), &config);
        // Development defaults carry no API key
        if config.truelist_api_key.is_none() {
            assert!(client.api_key().is_err());
        }
    }
}
