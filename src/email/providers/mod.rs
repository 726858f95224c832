// Third-party verification provider clients
pub mod bulkmail;
pub mod icypeas;
pub mod truelist;

pub use bulkmail::BulkMailVerifierClient;
pub use icypeas::IcyPeasClient;
pub use truelist::TruelistClient;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use super::types::{CatchallResolution, VerificationStatus};

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials missing. Kept distinguishable so endpoints can choose
    /// between a degraded empty result and a hard failure.
    #[error("{0} credentials are not configured")]
    NotConfigured(String),

    #[error("provider transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: String,
        message: String,
    },

    #[error("{0} polling deadline elapsed")]
    PollDeadline(String),
}

impl ProviderError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, ProviderError::NotConfigured(_))
    }
}

/// A verification backend. Implementations map their own status vocabulary
/// into [`VerificationStatus`] before returning; application code never sees
/// raw provider strings.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether credentials are present. Strategies check this up front so a
    /// missing key is reported once, not once per candidate.
    fn is_configured(&self) -> bool {
        true
    }

    /// Whether `verify_emails` is one real provider call. Bulk verification
    /// chunks for batch-capable providers and falls back to concurrent
    /// single probes otherwise.
    fn supports_batch(&self) -> bool {
        false
    }

    async fn verify_email(&self, email: &str) -> Result<VerificationStatus, ProviderError>;

    /// Verify a batch. Per-email transient failures are absorbed as
    /// `Unknown`; only total failures (missing credentials, submit/poll
    /// failure) surface as errors.
    async fn verify_emails(
        &self,
        emails: &[String],
    ) -> Result<HashMap<String, VerificationStatus>, ProviderError>;
}

/// Secondary provider used to upgrade a catch-all hit into a confident
/// answer, keyed on the person rather than a candidate address.
#[async_trait]
pub trait CatchallResolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve_catchall(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
        catchall_email: &str,
        catchall_status: VerificationStatus,
    ) -> Result<CatchallResolution, ProviderError>;
}

/// Shared HTTP client for all provider calls.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .build()?;
    Ok(client)
}
