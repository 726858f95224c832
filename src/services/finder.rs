use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config;
use crate::database::models::{User, UserActivity, ACTIVITY_EMAIL_FIND};
use crate::database::stores::Stores;
use crate::email::providers::ProviderError;
use crate::email::types::{EmailCandidate, FinderOutcome, SearchOutcome, VerificationStatus};
use crate::email::{generate_candidates, search_fingerprint, VerificationOrchestrator};

use super::credits::CreditService;

/// Candidates covered by the quick pre-pass of the single lookup.
const QUICK_PROBE_CANDIDATES: usize = 10;

/// Result of the synchronous batch finder endpoint.
#[derive(Debug, Serialize)]
pub struct FinderSearchReport {
    pub valid_emails: Vec<String>,
    pub total_valid: usize,
    pub first_email: Option<String>,
    pub first_email_status: Option<VerificationStatus>,
    pub generated_emails: Vec<String>,
    pub total_generated: usize,
    pub total_batches_processed: usize,
}

impl FinderSearchReport {
    /// The no-result shape endpoints degrade to when the provider is not
    /// configured.
    pub fn empty() -> Self {
        Self {
            valid_emails: Vec::new(),
            total_valid: 0,
            first_email: None,
            first_email_status: None,
            generated_emails: Vec::new(),
            total_generated: 0,
            total_batches_processed: 0,
        }
    }

    fn from_cache(email: String, status: VerificationStatus) -> Self {
        let valid = status == VerificationStatus::Valid;
        Self {
            valid_emails: if valid { vec![email.clone()] } else { Vec::new() },
            total_valid: usize::from(valid),
            first_email: Some(email),
            first_email_status: Some(status),
            generated_emails: Vec::new(),
            total_generated: 0,
            total_batches_processed: 0,
        }
    }
}

/// Answer of the sequential-until-first finder endpoint.
#[derive(Debug, Serialize)]
pub struct SequentialAnswer {
    pub valid_email: Option<String>,
    pub status: Option<VerificationStatus>,
}

impl SequentialAnswer {
    pub fn empty() -> Self {
        Self { valid_email: None, status: None }
    }

    fn from_outcome(outcome: &FinderOutcome) -> Self {
        Self {
            valid_email: outcome.email().map(str::to_string),
            status: outcome.status(),
        }
    }
}

/// Answer of the budgeted two-step single lookup.
#[derive(Debug, Serialize)]
pub struct SingleLookupAnswer {
    pub email: Option<String>,
    pub status: Option<VerificationStatus>,
    /// `"user_activities"` for a cache hit, `"verifier"` for a fresh find,
    /// `"none"` when nothing was found.
    pub source: &'static str,
    pub emails_checked: usize,
}

impl SingleLookupAnswer {
    pub fn empty() -> Self {
        Self { email: None, status: None, source: "none", emails_checked: 0 }
    }
}

/// Request-level finder workflow around the orchestrator: the prior-search
/// shortcut, credit charging on confirmed finds, and the activity trail
/// that feeds the shortcut.
pub struct FinderService {
    stores: Stores,
    orchestrator: Arc<VerificationOrchestrator>,
    credits: Arc<CreditService>,
}

impl FinderService {
    pub fn new(
        stores: Stores,
        orchestrator: Arc<VerificationOrchestrator>,
        credits: Arc<CreditService>,
    ) -> Self {
        Self { stores, orchestrator, credits }
    }

    /// Batch strategy over generated candidates with full reporting.
    pub async fn find_batch(
        &self,
        user: &User,
        first_name: &str,
        last_name: &str,
        domain: &str,
        count: usize,
    ) -> Result<FinderSearchReport, ProviderError> {
        let fingerprint = search_fingerprint(first_name, last_name, domain);
        if let Some((email, status)) = self.prior_find(user, &fingerprint).await {
            tracing::debug!("finder cache hit for {} (source user_activities)", fingerprint);
            return Ok(FinderSearchReport::from_cache(email, status));
        }

        let candidates = generate_candidates(
            first_name,
            last_name,
            domain,
            count,
        );
        let generated: Vec<String> = candidates.iter().map(|c| c.email.clone()).collect();
        let total_generated = generated.len();

        let finder = &config::config().finder;
        let batch_timeout = Duration::from_millis(finder.batch_timeout_ms);

        let mut results: HashMap<String, VerificationStatus> = HashMap::new();
        let mut batches = 0;
        let mut checked = 0;
        let mut outcome = FinderOutcome::NotFound;
        for chunk in candidates.chunks(finder.batch_cap) {
            let report = self.orchestrator.verify_batch_report(chunk, batch_timeout).await?;
            batches += 1;
            checked += report.emails_checked;
            results.extend(report.results);
            if report.outcome.is_found() {
                outcome = report.outcome;
                break;
            }
        }

        let settled = self
            .orchestrator
            .resolve_catchall_fallback(
                SearchOutcome { outcome, emails_checked: checked },
                first_name,
                last_name,
                domain,
            )
            .await;

        let mut valid_emails: Vec<String> = candidates
            .iter()
            .filter(|c| results.get(&c.email) == Some(&VerificationStatus::Valid))
            .map(|c| c.email.clone())
            .collect();
        // A resolver upgrade may land on an address outside the candidate set.
        if let FinderOutcome::FoundValid { email } = &settled.outcome {
            if !valid_emails.contains(email) {
                valid_emails.insert(0, email.clone());
            }
        }

        self.settle(user, &fingerprint, first_name, last_name, domain, &settled.outcome)
            .await;

        Ok(FinderSearchReport {
            first_email: settled.outcome.email().map(str::to_string),
            first_email_status: settled.outcome.status(),
            total_valid: valid_emails.len(),
            valid_emails,
            generated_emails: generated,
            total_generated,
            total_batches_processed: batches,
        })
    }

    /// Sequential-until-first strategy.
    pub async fn find_sequential(
        &self,
        user: &User,
        first_name: &str,
        last_name: &str,
        domain: &str,
        count: usize,
    ) -> Result<SequentialAnswer, ProviderError> {
        let fingerprint = search_fingerprint(first_name, last_name, domain);
        if let Some((email, status)) = self.prior_find(user, &fingerprint).await {
            return Ok(SequentialAnswer { valid_email: Some(email), status: Some(status) });
        }

        let candidates = generate_candidates(first_name, last_name, domain, count);
        let mut visited = HashSet::new();
        let outcome = self.orchestrator.verify_sequential(&candidates, &mut visited).await?;
        let settled = self
            .orchestrator
            .resolve_catchall_fallback(outcome, first_name, last_name, domain)
            .await;

        self.settle(user, &fingerprint, first_name, last_name, domain, &settled.outcome)
            .await;
        Ok(SequentialAnswer::from_outcome(&settled.outcome))
    }

    /// Two-step single lookup: prior-search shortcut, quick probe of the top
    /// patterns, then a full batch, all inside the overall budget. Catchall
    /// resolution is skipped here; its polling would blow the budget.
    pub async fn lookup_single(
        &self,
        user: &User,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<SingleLookupAnswer, ProviderError> {
        let fingerprint = search_fingerprint(first_name, last_name, domain);
        if let Some((email, status)) = self.prior_find(user, &fingerprint).await {
            return Ok(SingleLookupAnswer {
                email: Some(email),
                status: Some(status),
                source: "user_activities",
                emails_checked: 0,
            });
        }

        let finder = &config::config().finder;
        let budget = Duration::from_millis(finder.single_lookup_budget_ms);
        let candidates = generate_candidates(first_name, last_name, domain, finder.default_candidates);

        let outcome = match timeout(budget, self.two_step_probe(&candidates)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::debug!("single lookup budget exhausted for {}", fingerprint);
                SearchOutcome::not_found(candidates.len())
            }
        };

        self.settle(user, &fingerprint, first_name, last_name, domain, &outcome.outcome)
            .await;

        Ok(SingleLookupAnswer {
            email: outcome.outcome.email().map(str::to_string),
            status: outcome.outcome.status(),
            source: if outcome.outcome.is_found() { "verifier" } else { "none" },
            emails_checked: outcome.emails_checked,
        })
    }

    async fn two_step_probe(
        &self,
        candidates: &[EmailCandidate],
    ) -> Result<SearchOutcome, ProviderError> {
        let finder = &config::config().finder;

        let top = &candidates[..candidates.len().min(QUICK_PROBE_CANDIDATES)];
        let quick = self
            .orchestrator
            .verify_batch(top, Duration::from_millis(finder.quick_probe_timeout_ms))
            .await?;
        if quick.outcome.is_found() {
            return Ok(quick);
        }

        self.orchestrator
            .verify_batch(candidates, Duration::from_millis(finder.batch_timeout_ms))
            .await
    }

    /// Most recent successful find for the same person, if any. Store
    /// failures degrade to a miss.
    async fn prior_find(
        &self,
        user: &User,
        fingerprint: &str,
    ) -> Option<(String, VerificationStatus)> {
        let activity = match self
            .stores
            .activities
            .latest_success(user.id, ACTIVITY_EMAIL_FIND, fingerprint)
            .await
        {
            Ok(found) => found?,
            Err(e) => {
                tracing::warn!("prior-find lookup failed for {}: {}", fingerprint, e);
                return None;
            }
        };

        let email = activity.payload.get("email")?.as_str()?.to_string();
        let status = activity
            .payload
            .get("status")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(VerificationStatus::Valid);
        Some((email, status))
    }

    /// Charge and record a confirmed find. Both writes are secondary to the
    /// answer: failures are logged and never propagated.
    async fn settle(
        &self,
        user: &User,
        fingerprint: &str,
        first_name: &str,
        last_name: &str,
        domain: &str,
        outcome: &FinderOutcome,
    ) {
        let (email, status) = match (outcome.email(), outcome.status()) {
            (Some(email), Some(status)) => (email, status),
            _ => return,
        };

        let cost = config::config().credits.find_cost;
        if let Err(e) = self.credits.charge(user, cost, "email find").await {
            tracing::error!("credit charge failed for {}: {}", user.id, e);
        }

        let payload = json!({
            "email": email,
            "status": status,
            "first_name": first_name,
            "last_name": last_name,
            "domain": domain,
        });
        let activity = UserActivity::email_find(user.id, fingerprint.to_string(), payload, true);
        if let Err(e) = self.stores.activities.append(activity).await {
            tracing::warn!("find activity append failed for {}: {}", user.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::cache::NullCache;
    use crate::config::FinderConfig;
    use crate::email::providers::VerificationProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        results: HashMap<String, VerificationStatus>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(results: Vec<(&str, VerificationStatus)>) -> Self {
            Self {
                results: results.into_iter().map(|(e, s)| (e.to_string(), s)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VerificationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "truelist"
        }

        fn supports_batch(&self) -> bool {
            true
        }

        async fn verify_email(&self, email: &str) -> Result<VerificationStatus, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.get(email).copied().unwrap_or(VerificationStatus::Unknown))
        }

        async fn verify_emails(
            &self,
            emails: &[String],
        ) -> Result<HashMap<String, VerificationStatus>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(emails
                .iter()
                .map(|e| {
                    let status =
                        self.results.get(e).copied().unwrap_or(VerificationStatus::Unknown);
                    (e.clone(), status)
                })
                .collect())
        }
    }

    fn finder_config() -> FinderConfig {
        FinderConfig {
            default_candidates: 30,
            batch_cap: 51,
            batch_timeout_ms: 2000,
            quick_probe_timeout_ms: 500,
            single_lookup_budget_ms: 3000,
            probe_timeout_ms: 100,
            max_concurrency: 5,
            bulk_concurrency: 20,
            bulk_max_emails: 1000,
        }
    }

    struct Fixture {
        stores: Stores,
        service: FinderService,
        user: User,
    }

    async fn fixture(results: Vec<(&str, VerificationStatus)>) -> Fixture {
        let stores = Stores::in_memory();
        let user = stores
            .users
            .create(User::new(
                "finder@example.com".to_string(),
                "hash".to_string(),
                "Finder".to_string(),
                Role::FreeUser,
                25,
            ))
            .await
            .unwrap();

        let orchestrator = Arc::new(VerificationOrchestrator::new(
            Arc::new(ScriptedProvider::new(results)),
            None,
            finder_config(),
        ));
        let credits = Arc::new(CreditService::new(stores.clone(), Arc::new(NullCache)));
        let service = FinderService::new(stores.clone(), orchestrator, credits);
        Fixture { stores, service, user }
    }

    #[tokio::test]
    async fn test_confirmed_find_charges_and_records() {
        let fx = fixture(vec![("jane.doe@x.com", VerificationStatus::Valid)]).await;

        let report = fx
            .service
            .find_batch(&fx.user, "Jane", "Doe", "x.com", 10)
            .await
            .unwrap();
        assert_eq!(report.first_email.as_deref(), Some("jane.doe@x.com"));
        assert_eq!(report.first_email_status, Some(VerificationStatus::Valid));
        assert_eq!(report.total_valid, 1);
        assert_eq!(report.total_batches_processed, 1);
        assert_eq!(report.total_generated, 10);

        let balance = fx.stores.users.find_by_id(fx.user.id).await.unwrap().unwrap().credits;
        assert_eq!(balance, 24);

        let fingerprint = search_fingerprint("Jane", "Doe", "x.com");
        let trail = fx
            .stores
            .activities
            .latest_success(fx.user.id, ACTIVITY_EMAIL_FIND, &fingerprint)
            .await
            .unwrap();
        assert!(trail.is_some());
    }

    #[tokio::test]
    async fn test_not_found_is_free() {
        let fx = fixture(vec![]).await;

        let report = fx
            .service
            .find_batch(&fx.user, "Jane", "Doe", "x.com", 5)
            .await
            .unwrap();
        assert_eq!(report.first_email, None);
        assert_eq!(report.total_valid, 0);

        let balance = fx.stores.users.find_by_id(fx.user.id).await.unwrap().unwrap().credits;
        assert_eq!(balance, 25);
    }

    #[tokio::test]
    async fn test_prior_find_skips_provider() {
        let fx = fixture(vec![("jane.doe@x.com", VerificationStatus::Valid)]).await;

        let first = fx
            .service
            .find_batch(&fx.user, "Jane", "Doe", "x.com", 10)
            .await
            .unwrap();
        assert_eq!(first.total_batches_processed, 1);

        // Second identical search answers from the activity trail.
        let second = fx
            .service
            .find_batch(&fx.user, "Jane", "Doe", "x.com", 10)
            .await
            .unwrap();
        assert_eq!(second.first_email.as_deref(), Some("jane.doe@x.com"));
        assert_eq!(second.total_batches_processed, 0);
        assert_eq!(second.total_generated, 0);

        // Only the first search was charged.
        let balance = fx.stores.users.find_by_id(fx.user.id).await.unwrap().unwrap().credits;
        assert_eq!(balance, 24);
    }

    #[tokio::test]
    async fn test_sequential_answer_shape() {
        let fx = fixture(vec![("jane@x.com", VerificationStatus::Valid)]).await;

        let answer = fx
            .service
            .find_sequential(&fx.user, "Jane", "Doe", "x.com", 10)
            .await
            .unwrap();
        assert_eq!(answer.valid_email.as_deref(), Some("jane@x.com"));
        assert_eq!(answer.status, Some(VerificationStatus::Valid));
    }

    #[tokio::test]
    async fn test_single_lookup_quick_path() {
        let fx = fixture(vec![("jane.doe@x.com", VerificationStatus::Valid)]).await;

        let answer = fx
            .service
            .lookup_single(&fx.user, "Jane", "Doe", "x.com")
            .await
            .unwrap();
        assert_eq!(answer.email.as_deref(), Some("jane.doe@x.com"));
        assert_eq!(answer.source, "verifier");
        // Top pattern hits in the quick pre-pass.
        assert_eq!(answer.emails_checked, QUICK_PROBE_CANDIDATES);
    }

    #[tokio::test]
    async fn test_single_lookup_nothing_found() {
        let fx = fixture(vec![]).await;

        let answer = fx
            .service
            .lookup_single(&fx.user, "Jane", "Doe", "x.com")
            .await
            .unwrap();
        assert_eq!(answer.email, None);
        assert_eq!(answer.status, None);
        assert_eq!(answer.source, "none");
    }
}
