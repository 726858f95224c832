// Candidate verification strategies and winner selection
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::providers::{CatchallResolver, ProviderError, VerificationProvider};
use super::types::{EmailCandidate, FinderOutcome, SearchOutcome, VerificationStatus};
use crate::config::FinderConfig;

/// Run `tasks` with bounded concurrency and return the first completed
/// result accepted by `predicate`. Outstanding tasks are cancelled
/// structurally when the stream is dropped.
pub async fn race_until_first_match<T, Fut, P>(
    tasks: Vec<Fut>,
    predicate: P,
    max_concurrency: usize,
) -> Option<T>
where
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let mut results = stream::iter(tasks).buffer_unordered(max_concurrency.max(1));
    while let Some(result) = results.next().await {
        if predicate(&result) {
            return Some(result);
        }
    }
    None
}

/// Full result of one batch run, including the per-address status map.
#[derive(Debug)]
pub struct BatchReport {
    pub results: HashMap<String, VerificationStatus>,
    pub outcome: FinderOutcome,
    pub emails_checked: usize,
}

impl BatchReport {
    fn empty(emails_checked: usize) -> Self {
        Self {
            results: HashMap::new(),
            outcome: FinderOutcome::NotFound,
            emails_checked,
        }
    }
}

/// Resolves "the" email for a person by probing candidates against the
/// configured provider. Strategies differ in probe scheduling; all of them
/// translate provider timeouts and transient failures into "no result".
/// Only missing credentials surface as an error, so endpoints can decide
/// between degrading and failing.
pub struct VerificationOrchestrator {
    provider: Arc<dyn VerificationProvider>,
    resolver: Option<Arc<dyn CatchallResolver>>,
    finder: FinderConfig,
}

impl VerificationOrchestrator {
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        resolver: Option<Arc<dyn CatchallResolver>>,
        finder: FinderConfig,
    ) -> Self {
        Self { provider, resolver, finder }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.provider.is_configured() {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(self.provider.name().to_string()))
        }
    }

    /// Submit up to `batch_cap` candidates in one provider call under a hard
    /// timeout. Timeout or provider failure yields `NotFound` with the full
    /// candidate count, never an error.
    pub async fn verify_batch(
        &self,
        candidates: &[EmailCandidate],
        batch_timeout: Duration,
    ) -> Result<SearchOutcome, ProviderError> {
        let report = self.verify_batch_report(candidates, batch_timeout).await?;
        Ok(SearchOutcome {
            outcome: report.outcome,
            emails_checked: report.emails_checked,
        })
    }

    /// Batch strategy variant that keeps the per-address result map for
    /// callers that report more than the winner.
    pub async fn verify_batch_report(
        &self,
        candidates: &[EmailCandidate],
        batch_timeout: Duration,
    ) -> Result<BatchReport, ProviderError> {
        self.ensure_configured()?;

        let batch = &candidates[..candidates.len().min(self.finder.batch_cap)];
        if batch.is_empty() {
            return Ok(BatchReport::empty(0));
        }

        let emails: Vec<String> = batch.iter().map(|c| c.email.clone()).collect();
        let results = match timeout(batch_timeout, self.provider.verify_emails(&emails)).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) if e.is_not_configured() => return Err(e),
            Ok(Err(e)) => {
                tracing::warn!("batch verification failed on {}: {}", self.provider.name(), e);
                return Ok(BatchReport::empty(batch.len()));
            }
            Err(_) => {
                tracing::debug!(
                    "batch verification on {} exceeded {:?}",
                    self.provider.name(),
                    batch_timeout
                );
                return Ok(BatchReport::empty(batch.len()));
            }
        };

        Ok(BatchReport {
            outcome: select_winner(batch, &results),
            emails_checked: batch.len(),
            results,
        })
    }

    /// Verify an arbitrary email list, preserving input order in the output.
    /// Batch-capable providers get chunks of `batch_cap` per call; the rest
    /// are probed 1:1 with bounded concurrency. Failed chunks and probes
    /// degrade to UNKNOWN.
    pub async fn verify_many(
        &self,
        emails: &[String],
    ) -> Result<Vec<(String, VerificationStatus)>, ProviderError> {
        self.ensure_configured()?;

        let mut unique: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for email in emails {
            if seen.insert(email.clone()) {
                unique.push(email.clone());
            }
        }

        let mut statuses: HashMap<String, VerificationStatus> = HashMap::new();
        if self.provider.supports_batch() {
            for chunk in unique.chunks(self.finder.batch_cap) {
                match self.provider.verify_emails(chunk).await {
                    Ok(results) => statuses.extend(results),
                    Err(e) if e.is_not_configured() => return Err(e),
                    Err(e) => {
                        tracing::warn!("bulk chunk failed on {}: {}", self.provider.name(), e);
                    }
                }
            }
        } else {
            let probes: Vec<_> = unique
                .iter()
                .map(|email| {
                    let provider = Arc::clone(&self.provider);
                    let email = email.clone();
                    async move {
                        match provider.verify_email(&email).await {
                            Ok(status) => Ok((email, status)),
                            Err(e) if e.is_not_configured() => Err(e),
                            Err(e) => {
                                tracing::warn!("bulk probe failed for {}: {}", email, e);
                                Ok((email, VerificationStatus::Unknown))
                            }
                        }
                    }
                })
                .collect();

            let mut results =
                stream::iter(probes).buffer_unordered(self.finder.bulk_concurrency.max(1));
            while let Some(result) = results.next().await {
                let (email, status) = result?;
                statuses.insert(email, status);
            }
        }

        Ok(emails
            .iter()
            .map(|email| {
                let status = statuses
                    .get(email)
                    .copied()
                    .unwrap_or(VerificationStatus::Unknown);
                (email.clone(), status)
            })
            .collect())
    }

    /// Probe candidates one at a time in priority order, stopping at the
    /// first VALID or CATCHALL. `visited` carries probed addresses across
    /// calls so retries never hit the same address twice.
    pub async fn verify_sequential(
        &self,
        candidates: &[EmailCandidate],
        visited: &mut HashSet<String>,
    ) -> Result<SearchOutcome, ProviderError> {
        self.ensure_configured()?;

        let probe_timeout = Duration::from_millis(self.finder.probe_timeout_ms);
        let mut checked = 0;

        for candidate in candidates {
            if !visited.insert(candidate.email.clone()) {
                continue;
            }
            checked += 1;

            let status = match timeout(probe_timeout, self.provider.verify_email(&candidate.email)).await {
                Ok(Ok(status)) => status,
                Ok(Err(e)) if e.is_not_configured() => return Err(e),
                Ok(Err(e)) => {
                    tracing::warn!("probe failed for {}: {}", candidate.email, e);
                    VerificationStatus::Unknown
                }
                Err(_) => VerificationStatus::Unknown,
            };

            match status {
                VerificationStatus::Valid => {
                    return Ok(SearchOutcome {
                        outcome: FinderOutcome::FoundValid { email: candidate.email.clone() },
                        emails_checked: checked,
                    });
                }
                VerificationStatus::Catchall => {
                    return Ok(SearchOutcome {
                        outcome: FinderOutcome::FoundCatchall { email: candidate.email.clone() },
                        emails_checked: checked,
                    });
                }
                _ => {}
            }
        }

        Ok(SearchOutcome::not_found(checked))
    }

    /// Probe candidates with bounded concurrency and stop at the first
    /// match any probe reports. Losing probes are dropped mid-flight.
    pub async fn verify_concurrent(
        &self,
        candidates: &[EmailCandidate],
    ) -> Result<SearchOutcome, ProviderError> {
        self.ensure_configured()?;

        let probe_timeout = Duration::from_millis(self.finder.probe_timeout_ms);
        let tasks: Vec<_> = candidates
            .iter()
            .map(|candidate| {
                let provider = Arc::clone(&self.provider);
                let email = candidate.email.clone();
                async move {
                    let status = match timeout(probe_timeout, provider.verify_email(&email)).await {
                        Ok(Ok(status)) => status,
                        Ok(Err(e)) => {
                            tracing::warn!("probe failed for {}: {}", email, e);
                            VerificationStatus::Unknown
                        }
                        Err(_) => VerificationStatus::Unknown,
                    };
                    (email, status)
                }
            })
            .collect();

        let winner = race_until_first_match(
            tasks,
            |(_, status): &(String, VerificationStatus)| status.is_match(),
            self.finder.max_concurrency,
        )
        .await;

        let outcome = match winner {
            Some((email, VerificationStatus::Valid)) => FinderOutcome::FoundValid { email },
            Some((email, VerificationStatus::Catchall)) => FinderOutcome::FoundCatchall { email },
            _ => FinderOutcome::NotFound,
        };
        Ok(SearchOutcome { outcome, emails_checked: candidates.len() })
    }

    /// Upgrade a catch-all outcome through the secondary provider. Applies
    /// only when the primary was Truelist; any resolver failure keeps the
    /// original outcome.
    pub async fn resolve_catchall_fallback(
        &self,
        outcome: SearchOutcome,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> SearchOutcome {
        let catchall_email = match &outcome.outcome {
            FinderOutcome::FoundCatchall { email } if self.provider.name() == "truelist" => {
                email.clone()
            }
            _ => return outcome,
        };
        let resolver = match &self.resolver {
            Some(resolver) => Arc::clone(resolver),
            None => return outcome,
        };

        match resolver
            .resolve_catchall(
                first_name,
                last_name,
                domain,
                &catchall_email,
                VerificationStatus::Catchall,
            )
            .await
        {
            Ok(resolution) => match (resolution.email, resolution.status) {
                (Some(email), VerificationStatus::Valid) => SearchOutcome {
                    outcome: FinderOutcome::FoundValid { email },
                    emails_checked: outcome.emails_checked,
                },
                _ => outcome,
            },
            Err(e) => {
                tracing::warn!("catchall fallback via {} failed: {}", resolver.name(), e);
                outcome
            }
        }
    }
}

/// Batch winner selection. VALID beats CATCHALL regardless of pattern
/// priority; within a status the lowest priority index wins.
fn select_winner(
    candidates: &[EmailCandidate],
    results: &HashMap<String, VerificationStatus>,
) -> FinderOutcome {
    let best_valid = candidates
        .iter()
        .filter(|c| results.get(&c.email) == Some(&VerificationStatus::Valid))
        .min_by_key(|c| c.priority);
    if let Some(candidate) = best_valid {
        return FinderOutcome::FoundValid { email: candidate.email.clone() };
    }

    let best_catchall = candidates
        .iter()
        .filter(|c| results.get(&c.email) == Some(&VerificationStatus::Catchall))
        .min_by_key(|c| c.priority);
    if let Some(candidate) = best_catchall {
        return FinderOutcome::FoundCatchall { email: candidate.email.clone() };
    }

    FinderOutcome::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::types::CatchallResolution;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidate(email: &str, priority: usize) -> EmailCandidate {
        EmailCandidate { email: email.to_string(), priority }
    }

    fn finder_config() -> FinderConfig {
        FinderConfig {
            default_candidates: 30,
            batch_cap: 51,
            batch_timeout_ms: 2000,
            quick_probe_timeout_ms: 500,
            single_lookup_budget_ms: 3000,
            probe_timeout_ms: 100,
            max_concurrency: 2,
            bulk_concurrency: 20,
            bulk_max_emails: 1000,
        }
    }

    struct FakeProvider {
        configured: bool,
        batch: bool,
        delay: Duration,
        results: HashMap<String, VerificationStatus>,
        failing: HashSet<String>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn with_results(results: Vec<(&str, VerificationStatus)>) -> Self {
            Self {
                configured: true,
                batch: true,
                delay: Duration::ZERO,
                results: results
                    .into_iter()
                    .map(|(e, s)| (e.to_string(), s))
                    .collect(),
                failing: HashSet::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VerificationProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "truelist"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn supports_batch(&self) -> bool {
            self.batch
        }

        async fn verify_email(&self, email: &str) -> Result<VerificationStatus, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.failing.contains(email) {
                return Err(ProviderError::Api {
                    provider: "truelist".to_string(),
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(self.results.get(email).copied().unwrap_or(VerificationStatus::Unknown))
        }

        async fn verify_emails(
            &self,
            emails: &[String],
        ) -> Result<HashMap<String, VerificationStatus>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(emails
                .iter()
                .map(|e| {
                    let status = self.results.get(e).copied().unwrap_or(VerificationStatus::Unknown);
                    (e.clone(), status)
                })
                .collect())
        }
    }

    struct FakeResolver {
        resolution: Option<CatchallResolution>,
    }

    #[async_trait]
    impl CatchallResolver for FakeResolver {
        fn name(&self) -> &'static str {
            "icypeas"
        }

        async fn resolve_catchall(
            &self,
            _first_name: &str,
            _last_name: &str,
            _domain: &str,
            catchall_email: &str,
            catchall_status: VerificationStatus,
        ) -> Result<CatchallResolution, ProviderError> {
            match &self.resolution {
                Some(r) => Ok(r.clone()),
                None => Err(ProviderError::Api {
                    provider: "icypeas".to_string(),
                    status: 500,
                    message: format!("no answer for {} ({})", catchall_email, catchall_status),
                }),
            }
        }
    }

    fn orchestrator(provider: FakeProvider) -> VerificationOrchestrator {
        VerificationOrchestrator::new(Arc::new(provider), None, finder_config())
    }

    #[tokio::test]
    async fn test_batch_valid_beats_catchall() {
        let provider = FakeProvider::with_results(vec![
            ("a.b@x.com", VerificationStatus::Catchall),
            ("ab@x.com", VerificationStatus::Valid),
        ]);
        let orch = orchestrator(provider);
        let candidates = vec![candidate("a.b@x.com", 0), candidate("ab@x.com", 1)];

        let result = orch
            .verify_batch(&candidates, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(
            result.outcome,
            FinderOutcome::FoundValid { email: "ab@x.com".to_string() }
        );
        assert_eq!(result.emails_checked, 2);
    }

    #[tokio::test]
    async fn test_batch_lowest_index_catchall_wins() {
        let provider = FakeProvider::with_results(vec![
            ("a@x.com", VerificationStatus::Catchall),
            ("b@x.com", VerificationStatus::Catchall),
        ]);
        let orch = orchestrator(provider);
        // deliberately out of slice order; priority decides
        let candidates = vec![candidate("b@x.com", 1), candidate("a@x.com", 0)];

        let result = orch
            .verify_batch(&candidates, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(
            result.outcome,
            FinderOutcome::FoundCatchall { email: "a@x.com".to_string() }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_timeout_is_no_result() {
        let mut provider = FakeProvider::with_results(vec![("a@x.com", VerificationStatus::Valid)]);
        provider.delay = Duration::from_secs(10);
        let orch = orchestrator(provider);
        let candidates = vec![candidate("a@x.com", 0), candidate("b@x.com", 1)];

        let result = orch
            .verify_batch(&candidates, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(result.outcome, FinderOutcome::NotFound);
        assert_eq!(result.emails_checked, 2);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_an_error() {
        let mut provider = FakeProvider::with_results(vec![]);
        provider.configured = false;
        let orch = orchestrator(provider);
        let candidates = vec![candidate("a@x.com", 0)];

        let err = orch
            .verify_batch(&candidates, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.is_not_configured());
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_match() {
        let provider = FakeProvider::with_results(vec![
            ("a@x.com", VerificationStatus::Invalid),
            ("b@x.com", VerificationStatus::Valid),
            ("c@x.com", VerificationStatus::Valid),
        ]);
        let orch = orchestrator(provider);
        let candidates = vec![
            candidate("a@x.com", 0),
            candidate("b@x.com", 1),
            candidate("c@x.com", 2),
        ];

        let mut visited = HashSet::new();
        let result = orch.verify_sequential(&candidates, &mut visited).await.unwrap();
        assert_eq!(
            result.outcome,
            FinderOutcome::FoundValid { email: "b@x.com".to_string() }
        );
        assert_eq!(result.emails_checked, 2);
        assert!(!visited.contains("c@x.com"));
    }

    #[tokio::test]
    async fn test_sequential_skips_visited() {
        let provider = FakeProvider::with_results(vec![("b@x.com", VerificationStatus::Valid)]);
        let orch = orchestrator(provider);
        let candidates = vec![candidate("a@x.com", 0), candidate("b@x.com", 1)];

        let mut visited = HashSet::new();
        visited.insert("a@x.com".to_string());
        let result = orch.verify_sequential(&candidates, &mut visited).await.unwrap();
        assert_eq!(result.emails_checked, 1);
        assert_eq!(
            result.outcome,
            FinderOutcome::FoundValid { email: "b@x.com".to_string() }
        );
    }

    #[tokio::test]
    async fn test_sequential_transient_failures_continue() {
        let mut provider = FakeProvider::with_results(vec![("c@x.com", VerificationStatus::Catchall)]);
        provider.failing.insert("a@x.com".to_string());
        provider.failing.insert("b@x.com".to_string());
        let orch = orchestrator(provider);
        let candidates = vec![
            candidate("a@x.com", 0),
            candidate("b@x.com", 1),
            candidate("c@x.com", 2),
        ];

        let mut visited = HashSet::new();
        let result = orch.verify_sequential(&candidates, &mut visited).await.unwrap();
        assert_eq!(
            result.outcome,
            FinderOutcome::FoundCatchall { email: "c@x.com".to_string() }
        );
    }

    #[tokio::test]
    async fn test_concurrent_finds_match() {
        let provider = FakeProvider::with_results(vec![
            ("a@x.com", VerificationStatus::Invalid),
            ("b@x.com", VerificationStatus::Valid),
        ]);
        let orch = orchestrator(provider);
        let candidates = vec![candidate("a@x.com", 0), candidate("b@x.com", 1)];

        let result = orch.verify_concurrent(&candidates).await.unwrap();
        assert_eq!(
            result.outcome,
            FinderOutcome::FoundValid { email: "b@x.com".to_string() }
        );
        assert_eq!(result.emails_checked, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_race_cancels_losers() {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for (i, delay_ms) in [10u64, 50, 50].iter().enumerate() {
            let completed = Arc::clone(&completed);
            let delay = Duration::from_millis(*delay_ms);
            tasks.push(async move {
                tokio::time::sleep(delay).await;
                completed.fetch_add(1, Ordering::SeqCst);
                i
            });
        }

        let winner = race_until_first_match(tasks, |_| true, 3).await;
        assert_eq!(winner, Some(0));
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_race_exhausts_without_match() {
        let tasks: Vec<_> = (0..4).map(|i| async move { i }).collect();
        let winner = race_until_first_match(tasks, |v| *v > 10, 2).await;
        assert_eq!(winner, None);
    }

    #[tokio::test]
    async fn test_verify_many_preserves_input_order() {
        let provider = FakeProvider::with_results(vec![
            ("a@x.com", VerificationStatus::Valid),
            ("b@x.com", VerificationStatus::Invalid),
        ]);
        let orch = orchestrator(provider);
        let emails = vec![
            "b@x.com".to_string(),
            "a@x.com".to_string(),
            "b@x.com".to_string(),
        ];

        let results = orch.verify_many(&emails).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], ("b@x.com".to_string(), VerificationStatus::Invalid));
        assert_eq!(results[1], ("a@x.com".to_string(), VerificationStatus::Valid));
        assert_eq!(results[2], ("b@x.com".to_string(), VerificationStatus::Invalid));
    }

    #[tokio::test]
    async fn test_verify_many_direct_path_absorbs_failures() {
        let mut provider = FakeProvider::with_results(vec![("ok@x.com", VerificationStatus::Valid)]);
        provider.batch = false;
        provider.failing.insert("broken@x.com".to_string());
        let orch = orchestrator(provider);
        let emails = vec!["ok@x.com".to_string(), "broken@x.com".to_string()];

        let results = orch.verify_many(&emails).await.unwrap();
        assert_eq!(results[0].1, VerificationStatus::Valid);
        assert_eq!(results[1].1, VerificationStatus::Unknown);
    }

    #[tokio::test]
    async fn test_batch_report_keeps_result_map() {
        let provider = FakeProvider::with_results(vec![
            ("a@x.com", VerificationStatus::Valid),
            ("b@x.com", VerificationStatus::Catchall),
        ]);
        let orch = orchestrator(provider);
        let candidates = vec![candidate("a@x.com", 0), candidate("b@x.com", 1)];

        let report = orch
            .verify_batch_report(&candidates, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(
            report.outcome,
            FinderOutcome::FoundValid { email: "a@x.com".to_string() }
        );
    }

    #[tokio::test]
    async fn test_catchall_fallback_upgrades() {
        let provider = FakeProvider::with_results(vec![]);
        let resolver = FakeResolver {
            resolution: Some(CatchallResolution {
                email: Some("jane.doe@x.com".to_string()),
                status: VerificationStatus::Valid,
                certainty: Some("ultra_sure".to_string()),
            }),
        };
        let orch = VerificationOrchestrator::new(
            Arc::new(provider),
            Some(Arc::new(resolver)),
            finder_config(),
        );

        let outcome = SearchOutcome {
            outcome: FinderOutcome::FoundCatchall { email: "j.doe@x.com".to_string() },
            emails_checked: 5,
        };
        let resolved = orch.resolve_catchall_fallback(outcome, "Jane", "Doe", "x.com").await;
        assert_eq!(
            resolved.outcome,
            FinderOutcome::FoundValid { email: "jane.doe@x.com".to_string() }
        );
        assert_eq!(resolved.emails_checked, 5);
    }

    #[tokio::test]
    async fn test_catchall_fallback_error_keeps_original() {
        let provider = FakeProvider::with_results(vec![]);
        let resolver = FakeResolver { resolution: None };
        let orch = VerificationOrchestrator::new(
            Arc::new(provider),
            Some(Arc::new(resolver)),
            finder_config(),
        );

        let outcome = SearchOutcome {
            outcome: FinderOutcome::FoundCatchall { email: "j.doe@x.com".to_string() },
            emails_checked: 3,
        };
        let resolved = orch
            .resolve_catchall_fallback(outcome.clone(), "Jane", "Doe", "x.com")
            .await;
        assert_eq!(resolved, outcome);
    }

    #[tokio::test]
    async fn test_valid_outcome_skips_fallback() {
        let provider = FakeProvider::with_results(vec![]);
        let resolver = FakeResolver {
            resolution: Some(CatchallResolution {
                email: Some("other@x.com".to_string()),
                status: VerificationStatus::Valid,
                certainty: Some("sure".to_string()),
            }),
        };
        let orch = VerificationOrchestrator::new(
            Arc::new(provider),
            Some(Arc::new(resolver)),
            finder_config(),
        );

        let outcome = SearchOutcome {
            outcome: FinderOutcome::FoundValid { email: "jane@x.com".to_string() },
            emails_checked: 1,
        };
        let resolved = orch
            .resolve_catchall_fallback(outcome.clone(), "Jane", "Doe", "x.com")
            .await;
        assert_eq!(resolved, outcome);
    }
}
