// Store traits with Postgres and in-memory implementations
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::models::{FeatureUsage, Page, PageKind, User, UserActivity, UserHistory, UserProfile};
use super::StoreResult;
use crate::access::Role;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Duplicate emails are a `Conflict`.
    async fn create(&self, user: User) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn update(&self, user: &User) -> StoreResult<()>;

    /// Atomic signed credit adjustment; returns the new balance. There is
    /// deliberately no floor: balances may go negative.
    async fn adjust_credits(&self, id: Uuid, delta: i64) -> StoreResult<i64>;

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<()>;

    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>>;

    async fn count(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Insert or replace the profile for `profile.user_id`.
    async fn upsert(&self, profile: UserProfile) -> StoreResult<UserProfile>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append(&self, activity: UserActivity) -> StoreResult<()>;

    /// Most recent successful activity matching (user, type, fingerprint).
    async fn latest_success(
        &self,
        user_id: Uuid,
        activity_type: &str,
        fingerprint: &str,
    ) -> StoreResult<Option<UserActivity>>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: UserHistory) -> StoreResult<()>;

    async fn recent(&self, user_id: Uuid, event: &str, limit: i64) -> StoreResult<Vec<UserHistory>>;
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn get(
        &self,
        user_id: Uuid,
        feature: &str,
        period: &str,
    ) -> StoreResult<Option<FeatureUsage>>;

    async fn upsert(&self, usage: FeatureUsage) -> StoreResult<FeatureUsage>;

    async fn list_for_period(&self, user_id: Uuid, period: &str) -> StoreResult<Vec<FeatureUsage>>;
}

#[async_trait]
pub trait PageStore: Send + Sync {
    async fn find(&self, page_id: &str, kind: PageKind) -> StoreResult<Option<Page>>;

    async fn upsert(&self, page: Page) -> StoreResult<Page>;
}

/// The full set of stores, injected into application state. Production
/// wires Postgres; tests wire memory.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub activities: Arc<dyn ActivityStore>,
    pub history: Arc<dyn HistoryStore>,
    pub usage: Arc<dyn UsageStore>,
    pub pages: Arc<dyn PageStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserStore::new(pool.clone())),
            profiles: Arc::new(postgres::PgProfileStore::new(pool.clone())),
            activities: Arc::new(postgres::PgActivityStore::new(pool.clone())),
            history: Arc::new(postgres::PgHistoryStore::new(pool.clone())),
            usage: Arc::new(postgres::PgUsageStore::new(pool.clone())),
            pages: Arc::new(postgres::PgPageStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::InMemoryUserStore::new()),
            profiles: Arc::new(memory::InMemoryProfileStore::new()),
            activities: Arc::new(memory::InMemoryActivityStore::new()),
            history: Arc::new(memory::InMemoryHistoryStore::new()),
            usage: Arc::new(memory::InMemoryUsageStore::new()),
            pages: Arc::new(memory::InMemoryPageStore::new()),
        }
    }
}
