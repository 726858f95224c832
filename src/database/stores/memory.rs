// In-memory stores for tests and DATABASE_URL-less development
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ActivityStore, HistoryStore, PageStore, ProfileStore, UsageStore, UserStore};
use crate::access::Role;
use crate::database::models::{FeatureUsage, Page, PageKind, User, UserActivity, UserHistory, UserProfile};
use crate::database::{StoreError, StoreResult};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict("Email is already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let entry = users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::NotFound(format!("User {} not found", user.id)))?;
        *entry = user.clone();
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn adjust_credits(&self, id: Uuid, delta: i64) -> StoreResult<i64> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("User {} not found", id)))?;
        user.credits += delta;
        user.updated_at = Utc::now();
        Ok(user.credits)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("User {} not found", id)))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<Uuid, UserProfile>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, profile: UserProfile) -> StoreResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let stored = match profiles.get(&profile.user_id) {
            // Keep the original identity of the row, refresh everything else.
            Some(existing) => UserProfile {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: Utc::now(),
                ..profile
            },
            None => profile,
        };
        profiles.insert(stored.user_id, stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub struct InMemoryActivityStore {
    activities: Arc<RwLock<Vec<UserActivity>>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn append(&self, activity: UserActivity) -> StoreResult<()> {
        self.activities.write().await.push(activity);
        Ok(())
    }

    async fn latest_success(
        &self,
        user_id: Uuid,
        activity_type: &str,
        fingerprint: &str,
    ) -> StoreResult<Option<UserActivity>> {
        let activities = self.activities.read().await;
        Ok(activities
            .iter()
            .filter(|a| {
                a.user_id == user_id
                    && a.activity_type == activity_type
                    && a.success
                    && a.fingerprint.as_deref() == Some(fingerprint)
            })
            .max_by_key(|a| a.created_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: Arc<RwLock<Vec<UserHistory>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entry: UserHistory) -> StoreResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn recent(&self, user_id: Uuid, event: &str, limit: i64) -> StoreResult<Vec<UserHistory>> {
        let entries = self.entries.read().await;
        let mut matching: Vec<UserHistory> = entries
            .iter()
            .filter(|e| e.user_id == user_id && e.event == event)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryUsageStore {
    usage: Arc<RwLock<HashMap<(Uuid, String, String), FeatureUsage>>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn get(
        &self,
        user_id: Uuid,
        feature: &str,
        period: &str,
    ) -> StoreResult<Option<FeatureUsage>> {
        let key = (user_id, feature.to_string(), period.to_string());
        Ok(self.usage.read().await.get(&key).cloned())
    }

    async fn upsert(&self, usage: FeatureUsage) -> StoreResult<FeatureUsage> {
        let key = (usage.user_id, usage.feature.clone(), usage.period.clone());
        let mut table = self.usage.write().await;
        let stored = match table.get(&key) {
            Some(existing) => FeatureUsage {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: Utc::now(),
                ..usage
            },
            None => usage,
        };
        table.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_for_period(&self, user_id: Uuid, period: &str) -> StoreResult<Vec<FeatureUsage>> {
        let table = self.usage.read().await;
        let mut rows: Vec<FeatureUsage> = table
            .values()
            .filter(|u| u.user_id == user_id && u.period == period)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.feature.cmp(&b.feature));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryPageStore {
    pages: Arc<RwLock<HashMap<(String, &'static str), Page>>>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn find(&self, page_id: &str, kind: PageKind) -> StoreResult<Option<Page>> {
        let key = (page_id.to_string(), kind.as_str());
        Ok(self.pages.read().await.get(&key).cloned())
    }

    async fn upsert(&self, page: Page) -> StoreResult<Page> {
        let key = (page.page_id.clone(), page.kind.as_str());
        let mut pages = self.pages.write().await;
        let stored = match pages.get(&key) {
            Some(existing) => Page {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: Utc::now(),
                ..page
            },
            None => page,
        };
        pages.insert(key, stored.clone());
        Ok(stored)
    }
}
