// IcyPeas email search client, used to disambiguate catch-all domains
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::{CatchallResolver, ProviderError};
use crate::config::ProviderConfig;
use crate::email::types::{CatchallResolution, VerificationStatus};

const PROVIDER: &str = "icypeas";

/// Person-keyed search: submit (first, last, domain), poll until the search
/// settles, read out the best email with its certainty grade. Sure grades
/// upgrade a catch-all to VALID; anything weaker keeps the original result.
#[derive(Clone)]
pub struct IcyPeasClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    poll_interval: Duration,
    poll_deadline: Duration,
}

#[derive(Debug, Deserialize)]
struct LaunchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    item: Option<LaunchItem>,
}

#[derive(Debug, Deserialize)]
struct LaunchItem {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    emails: Vec<FoundEmail>,
}

#[derive(Debug, Deserialize)]
struct FoundEmail {
    email: String,
    #[serde(default)]
    certainty: Option<String>,
}

impl IcyPeasClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.icypeas_base_url.trim_end_matches('/').to_string(),
            api_key: config.icypeas_api_key.clone(),
            api_secret: config.icypeas_api_secret.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_deadline: Duration::from_millis(config.poll_deadline_ms),
        }
    }

    fn credentials(&self) -> Result<&str, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(PROVIDER.to_string()))?;
        // The secret is required by the account even though only the key
        // rides the Authorization header.
        self.api_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(PROVIDER.to_string()))?;
        Ok(key)
    }

    async fn launch_search(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<String, ProviderError> {
        let key = self.credentials()?;
        let url = format!("{}/email-search", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", key)
            .json(&serde_json::json!({
                "firstname": first_name,
                "lastname": last_name,
                "domainOrCompany": domain,
            }))
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

        let launch: LaunchResponse = response.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;

        match launch.item {
            Some(item) if launch.success => Ok(item.id),
            _ => Err(ProviderError::Decode {
                provider: PROVIDER.to_string(),
                message: "search was not accepted".to_string(),
            }),
        }
    }

    async fn poll_search(&self, search_id: &str) -> Result<Option<FoundEmail>, ProviderError> {
        let key = self.credentials()?;
        let url = format!("{}/bulk-single-searchs/read", self.base_url);
        let deadline = Instant::now() + self.poll_deadline;

        loop {
            let response = self
                .client
                .post(&url)
                .header("Authorization", key)
                .json(&serde_json::json!({ "id": search_id }))
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

            let read: ReadResponse = response.json().await.map_err(|e| ProviderError::Decode {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

            if let Some(item) = read.items.into_iter().next() {
                if is_terminal(item.status.as_deref()) {
                    let best = item.results.and_then(|r| r.emails.into_iter().next());
                    return Ok(best);
                }
            }

            if Instant::now() + self.poll_interval >= deadline {
                return Err(ProviderError::PollDeadline(PROVIDER.to_string()));
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl CatchallResolver for IcyPeasClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn resolve_catchall(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
        catchall_email: &str,
        catchall_status: VerificationStatus,
    ) -> Result<CatchallResolution, ProviderError> {
        let search_id = self.launch_search(first_name, last_name, domain).await?;
        let found = self.poll_search(&search_id).await?;

        match found {
            Some(hit) if is_sure(hit.certainty.as_deref()) => Ok(CatchallResolution {
                email: Some(hit.email),
                status: VerificationStatus::Valid,
                certainty: hit.certainty,
            }),
            Some(hit) => Ok(CatchallResolution {
                email: Some(catchall_email.to_string()),
                status: catchall_status,
                certainty: hit.certainty,
            }),
            None => Ok(CatchallResolution {
                email: Some(catchall_email.to_string()),
                status: catchall_status,
                certainty: None,
            }),
        }
    }
}

fn is_terminal(status: Option<&str>) -> bool {
    matches!(
        status,
        Some("DEBITED") | Some("FOUND") | Some("NOT_FOUND") | Some("COMPLETED") | Some("FAILED")
    )
}

/// Certainty grades considered strong enough to report the address as VALID.
fn is_sure(certainty: Option<&str>) -> bool {
    matches!(certainty, Some("ultra_sure") | Some("very_sure") | Some("sure"))
}
