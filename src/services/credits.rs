use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::cache::CachePort;
use crate::database::models::{User, UserHistory, EVENT_CREDIT_ADJUSTMENT};
use crate::database::stores::Stores;
use crate::database::StoreResult;

/// Balance plus the adjustments behind it, for the credits endpoint.
#[derive(Debug, Serialize)]
pub struct CreditSummary {
    pub balance: i64,
    pub recent: Vec<UserHistory>,
}

/// Signed credit accounting. Deductions have no floor: the balance may go
/// negative, which billing reconciliation picks up elsewhere. Admin roles
/// are never charged.
pub struct CreditService {
    stores: Stores,
    cache: Arc<dyn CachePort>,
}

impl CreditService {
    pub fn new(stores: Stores, cache: Arc<dyn CachePort>) -> Self {
        Self { stores, cache }
    }

    /// Deduct `amount` credits and return the new balance. A history row
    /// records the adjustment; its failure is logged, never propagated.
    pub async fn charge(&self, user: &User, amount: i64, reason: &str) -> StoreResult<i64> {
        if user.role.is_admin() {
            return Ok(user.credits);
        }

        let balance = self.stores.users.adjust_credits(user.id, -amount).await?;
        self.cache.delete("users", &user.id.to_string()).await;

        let entry = UserHistory::new(
            user.id,
            EVENT_CREDIT_ADJUSTMENT,
            json!({
                "delta": -amount,
                "balance": balance,
                "reason": reason,
            }),
        );
        if let Err(e) = self.stores.history.append(entry).await {
            tracing::warn!("credit history append failed for {}: {}", user.id, e);
        }

        Ok(balance)
    }

    /// Current balance with recent adjustments.
    pub async fn summary(&self, user: &User) -> StoreResult<CreditSummary> {
        let balance = self
            .stores
            .users
            .find_by_id(user.id)
            .await?
            .map(|u| u.credits)
            .unwrap_or(user.credits);
        let recent = self
            .stores
            .history
            .recent(user.id, EVENT_CREDIT_ADJUSTMENT, 20)
            .await?;
        Ok(CreditSummary { balance, recent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::cache::NullCache;

    fn service(stores: Stores) -> CreditService {
        CreditService::new(stores, Arc::new(NullCache))
    }

    async fn seeded_user(stores: &Stores, role: Role, credits: i64) -> User {
        let user = User::new(
            "credits@example.com".to_string(),
            "hash".to_string(),
            "Test".to_string(),
            role,
            credits,
        );
        stores.users.create(user).await.unwrap()
    }

    #[tokio::test]
    async fn test_charge_has_no_floor() {
        let stores = Stores::in_memory();
        let user = seeded_user(&stores, Role::FreeUser, 5).await;
        let service = service(stores.clone());

        let balance = service.charge(&user, 10, "email find").await.unwrap();
        assert_eq!(balance, -5);

        let summary = service.summary(&user).await.unwrap();
        assert_eq!(summary.balance, -5);
        assert_eq!(summary.recent.len(), 1);
        assert_eq!(summary.recent[0].detail["delta"], -10);
    }

    #[tokio::test]
    async fn test_admin_is_never_charged() {
        let stores = Stores::in_memory();
        let user = seeded_user(&stores, Role::Admin, 100).await;
        let service = service(stores.clone());

        let balance = service.charge(&user, 10, "email find").await.unwrap();
        assert_eq!(balance, 100);

        let summary = service.summary(&user).await.unwrap();
        assert_eq!(summary.balance, 100);
        assert!(summary.recent.is_empty());
    }
}
