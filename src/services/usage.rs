use serde::Serialize;

use crate::access::Role;
use crate::config::{self, FeatureLimits};
use crate::database::models::{current_period, FeatureUsage, User};
use crate::database::stores::Stores;
use crate::database::StoreResult;

/// Metered features. Wire names double as the `feature_usage.feature` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    EmailFinder,
    EmailVerifier,
    BulkVerifier,
    AiChat,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::EmailFinder,
        Feature::EmailVerifier,
        Feature::BulkVerifier,
        Feature::AiChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::EmailFinder => "email_finder",
            Feature::EmailVerifier => "email_verifier",
            Feature::BulkVerifier => "bulk_verifier",
            Feature::AiChat => "ai_chat",
        }
    }

    fn limit_in(&self, limits: &FeatureLimits) -> Option<i64> {
        match self {
            Feature::EmailFinder => limits.email_finder,
            Feature::EmailVerifier => limits.email_verifier,
            Feature::BulkVerifier => limits.bulk_verifier,
            Feature::AiChat => limits.ai_chat,
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a metering check. Denial is a decision, not an error;
/// handlers translate it to 429.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageDecision {
    Unlimited,
    Allowed { remaining: i64 },
    Denied { limit: i64 },
}

impl UsageDecision {
    pub fn is_denied(&self) -> bool {
        matches!(self, UsageDecision::Denied { .. })
    }
}

/// One row of the current-period usage report.
#[derive(Debug, Serialize)]
pub struct FeatureUsageReport {
    pub feature: &'static str,
    pub period: String,
    pub used: i64,
    /// Monthly cap; absent means unlimited for this user.
    pub limit: Option<i64>,
}

/// Per-feature monthly metering. Counters are keyed on the current
/// `YYYY-MM` period, so a new month starts from zero without a scheduler.
pub struct UsageService {
    stores: Stores,
}

impl UsageService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    fn limit_for(role: Role, feature: Feature) -> Option<i64> {
        let limits = &config::config().limits;
        match role {
            Role::ProUser => feature.limit_in(&limits.pro),
            _ => feature.limit_in(&limits.free),
        }
    }

    /// Count `amount` uses of `feature` against the current period.
    /// Admin roles are never metered. The stored counter is clamped at the
    /// limit so it never exceeds it.
    pub async fn track(
        &self,
        user: &User,
        feature: Feature,
        amount: i64,
    ) -> StoreResult<UsageDecision> {
        if user.role.is_admin() {
            return Ok(UsageDecision::Unlimited);
        }

        let limit = Self::limit_for(user.role, feature);
        if limit == Some(0) {
            return Ok(UsageDecision::Denied { limit: 0 });
        }

        let period = current_period();
        let mut usage = self
            .stores
            .usage
            .get(user.id, feature.as_str(), &period)
            .await?
            .unwrap_or_else(|| FeatureUsage::new(user.id, feature.as_str(), &period));

        match limit {
            None => {
                usage.used += amount;
                self.stores.usage.upsert(usage).await?;
                Ok(UsageDecision::Unlimited)
            }
            Some(limit) => {
                if usage.used >= limit {
                    return Ok(UsageDecision::Denied { limit });
                }
                usage.used = (usage.used + amount).min(limit);
                let stored = self.stores.usage.upsert(usage).await?;
                Ok(UsageDecision::Allowed { remaining: limit - stored.used })
            }
        }
    }

    /// Current-period counters for every feature, with the user's limits.
    pub async fn report(&self, user: &User) -> StoreResult<Vec<FeatureUsageReport>> {
        let period = current_period();
        let rows = self.stores.usage.list_for_period(user.id, &period).await?;

        Ok(Feature::ALL
            .iter()
            .map(|feature| {
                let used = rows
                    .iter()
                    .find(|r| r.feature == feature.as_str())
                    .map(|r| r.used)
                    .unwrap_or(0);
                let limit = if user.role.is_admin() {
                    None
                } else {
                    Self::limit_for(user.role, *feature)
                };
                FeatureUsageReport { feature: feature.as_str(), period: period.clone(), used, limit }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> UsageService {
        UsageService::new(Stores::in_memory())
    }

    fn user_with_role(role: Role) -> User {
        User::new(
            format!("{}@example.com", role.as_str()),
            "hash".to_string(),
            "Test".to_string(),
            role,
            25,
        )
    }

    #[tokio::test]
    async fn test_free_tier_clamps_at_limit() {
        let service = service();
        let user = user_with_role(Role::FreeUser);

        // email_finder free limit is 10
        for _ in 0..10 {
            let decision = service.track(&user, Feature::EmailFinder, 1).await.unwrap();
            assert!(matches!(decision, UsageDecision::Allowed { .. }));
        }

        let eleventh = service.track(&user, Feature::EmailFinder, 1).await.unwrap();
        assert_eq!(eleventh, UsageDecision::Denied { limit: 10 });

        let report = service.report(&user).await.unwrap();
        let finder = report.iter().find(|r| r.feature == "email_finder").unwrap();
        assert_eq!(finder.used, 10);
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let service = service();
        let user = user_with_role(Role::FreeUser);

        let first = service.track(&user, Feature::AiChat, 1).await.unwrap();
        assert_eq!(first, UsageDecision::Allowed { remaining: 4 });
        let second = service.track(&user, Feature::AiChat, 1).await.unwrap();
        assert_eq!(second, UsageDecision::Allowed { remaining: 3 });
    }

    #[tokio::test]
    async fn test_zero_limit_denies_outright() {
        let service = service();
        let user = user_with_role(Role::FreeUser);

        // bulk_verifier is disabled on the free tier
        let decision = service.track(&user, Feature::BulkVerifier, 1).await.unwrap();
        assert_eq!(decision, UsageDecision::Denied { limit: 0 });

        let report = service.report(&user).await.unwrap();
        let bulk = report.iter().find(|r| r.feature == "bulk_verifier").unwrap();
        assert_eq!(bulk.used, 0);
    }

    #[tokio::test]
    async fn test_pro_unlimited_still_counts() {
        let service = service();
        let user = user_with_role(Role::ProUser);

        for _ in 0..25 {
            let decision = service.track(&user, Feature::EmailFinder, 1).await.unwrap();
            assert_eq!(decision, UsageDecision::Unlimited);
        }

        let report = service.report(&user).await.unwrap();
        let finder = report.iter().find(|r| r.feature == "email_finder").unwrap();
        assert_eq!(finder.used, 25);
        assert_eq!(finder.limit, None);
    }

    #[tokio::test]
    async fn test_admin_is_never_metered() {
        let service = service();
        let user = user_with_role(Role::Admin);

        let decision = service.track(&user, Feature::BulkVerifier, 100).await.unwrap();
        assert_eq!(decision, UsageDecision::Unlimited);

        let report = service.report(&user).await.unwrap();
        assert!(report.iter().all(|r| r.used == 0 && r.limit.is_none()));
    }

    #[tokio::test]
    async fn test_oversized_amount_clamps() {
        let service = service();
        let user = user_with_role(Role::FreeUser);

        // ai_chat free limit is 5; a 4-step then 3-step increment may not
        // push the counter past the cap.
        service.track(&user, Feature::AiChat, 4).await.unwrap();
        let decision = service.track(&user, Feature::AiChat, 3).await.unwrap();
        assert_eq!(decision, UsageDecision::Allowed { remaining: 0 });

        let report = service.report(&user).await.unwrap();
        let chat = report.iter().find(|r| r.feature == "ai_chat").unwrap();
        assert_eq!(chat.used, 5);
    }
}
