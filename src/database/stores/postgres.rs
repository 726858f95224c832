// Postgres-backed stores
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use super::{ActivityStore, HistoryStore, PageStore, ProfileStore, UsageStore, UserStore};
use crate::access::Role;
use crate::database::models::{FeatureUsage, Page, PageKind, User, UserActivity, UserHistory, UserProfile};
use crate::database::{StoreError, StoreResult};

// Roles and page kinds live in TEXT columns; rows decode to these structs
// first and are lifted into domain types afterwards.

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    credits: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Query(format!("unknown role '{}' for user {}", row.role, row.id)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            role,
            credits: row.credits,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, credits, is_active, created_at, updated_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: User) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, credits, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.credits)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict("Email is already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, role = $5,
                credits = $6, is_active = $7, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.credits)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("User {} not found", user.id)));
        }
        Ok(())
    }

    async fn adjust_credits(&self, id: Uuid, delta: i64) -> StoreResult<i64> {
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET credits = credits + $2, updated_at = now() WHERE id = $1 RETURNING credits",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        balance.ok_or_else(|| StoreError::NotFound(format!("User {} not found", id)))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    company: Option<String>,
    phone: Option<String>,
    timezone: Option<String>,
    preferences: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            company: row.company,
            phone: row.phone,
            timezone: row.timezone,
            preferences: row.preferences,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, user_id, first_name, last_name, company, phone, timezone, preferences, created_at, updated_at
             FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn upsert(&self, profile: UserProfile) -> StoreResult<UserProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO user_profiles (id, user_id, first_name, last_name, company, phone, timezone, preferences, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                company = EXCLUDED.company,
                phone = EXCLUDED.phone,
                timezone = EXCLUDED.timezone,
                preferences = EXCLUDED.preferences,
                updated_at = now()
            RETURNING id, user_id, first_name, last_name, company, phone, timezone, preferences, created_at, updated_at
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.company)
        .bind(&profile.phone)
        .bind(&profile.timezone)
        .bind(&profile.preferences)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    user_id: Uuid,
    activity_type: String,
    fingerprint: Option<String>,
    payload: Value,
    success: bool,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for UserActivity {
    fn from(row: ActivityRow) -> Self {
        UserActivity {
            id: row.id,
            user_id: row.user_id,
            activity_type: row.activity_type,
            fingerprint: row.fingerprint,
            payload: row.payload,
            success: row.success,
            created_at: row.created_at,
        }
    }
}

pub struct PgActivityStore {
    pool: PgPool,
}

impl PgActivityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn append(&self, activity: UserActivity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_activities (id, user_id, activity_type, fingerprint, payload, success, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(activity.id)
        .bind(activity.user_id)
        .bind(&activity.activity_type)
        .bind(&activity.fingerprint)
        .bind(&activity.payload)
        .bind(activity.success)
        .bind(activity.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_success(
        &self,
        user_id: Uuid,
        activity_type: &str,
        fingerprint: &str,
    ) -> StoreResult<Option<UserActivity>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, user_id, activity_type, fingerprint, payload, success, created_at
            FROM user_activities
            WHERE user_id = $1 AND activity_type = $2 AND fingerprint = $3 AND success = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(activity_type)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserActivity::from))
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    user_id: Uuid,
    event: String,
    detail: Value,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for UserHistory {
    fn from(row: HistoryRow) -> Self {
        UserHistory {
            id: row.id,
            user_id: row.user_id,
            event: row.event,
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, entry: UserHistory) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_history (id, user_id, event, detail, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.event)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, user_id: Uuid, event: &str, limit: i64) -> StoreResult<Vec<UserHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, user_id, event, detail, created_at
            FROM user_history
            WHERE user_id = $1 AND event = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(event)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserHistory::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct UsageRow {
    id: Uuid,
    user_id: Uuid,
    feature: String,
    period: String,
    used: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UsageRow> for FeatureUsage {
    fn from(row: UsageRow) -> Self {
        FeatureUsage {
            id: row.id,
            user_id: row.user_id,
            feature: row.feature,
            period: row.period,
            used: row.used,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn get(
        &self,
        user_id: Uuid,
        feature: &str,
        period: &str,
    ) -> StoreResult<Option<FeatureUsage>> {
        let row = sqlx::query_as::<_, UsageRow>(
            "SELECT id, user_id, feature, period, used, created_at, updated_at
             FROM feature_usage WHERE user_id = $1 AND feature = $2 AND period = $3",
        )
        .bind(user_id)
        .bind(feature)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FeatureUsage::from))
    }

    async fn upsert(&self, usage: FeatureUsage) -> StoreResult<FeatureUsage> {
        let row = sqlx::query_as::<_, UsageRow>(
            r#"
            INSERT INTO feature_usage (id, user_id, feature, period, used, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, feature, period) DO UPDATE
            SET used = EXCLUDED.used, updated_at = now()
            RETURNING id, user_id, feature, period, used, created_at, updated_at
            "#,
        )
        .bind(usage.id)
        .bind(usage.user_id)
        .bind(&usage.feature)
        .bind(&usage.period)
        .bind(usage.used)
        .bind(usage.created_at)
        .bind(usage.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_for_period(&self, user_id: Uuid, period: &str) -> StoreResult<Vec<FeatureUsage>> {
        let rows = sqlx::query_as::<_, UsageRow>(
            "SELECT id, user_id, feature, period, used, created_at, updated_at
             FROM feature_usage WHERE user_id = $1 AND period = $2 ORDER BY feature",
        )
        .bind(user_id)
        .bind(period)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FeatureUsage::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct PageRow {
    id: Uuid,
    page_id: String,
    kind: String,
    content: Value,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PageRow> for Page {
    type Error = StoreError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "marketing" => PageKind::Marketing,
            "dashboard" => PageKind::Dashboard,
            other => {
                return Err(StoreError::Query(format!(
                    "unknown page kind '{}' for page {}",
                    other, row.id
                )))
            }
        };
        Ok(Page {
            id: row.id,
            page_id: row.page_id,
            kind,
            content: row.content,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgPageStore {
    pool: PgPool,
}

impl PgPageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageStore for PgPageStore {
    async fn find(&self, page_id: &str, kind: PageKind) -> StoreResult<Option<Page>> {
        let row = sqlx::query_as::<_, PageRow>(
            "SELECT id, page_id, kind, content, published, created_at, updated_at
             FROM pages WHERE page_id = $1 AND kind = $2",
        )
        .bind(page_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Page::try_from).transpose()
    }

    async fn upsert(&self, page: Page) -> StoreResult<Page> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            INSERT INTO pages (id, page_id, kind, content, published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (page_id, kind) DO UPDATE
            SET content = EXCLUDED.content, published = EXCLUDED.published, updated_at = now()
            RETURNING id, page_id, kind, content, published, created_at, updated_at
            "#,
        )
        .bind(page.id)
        .bind(&page.page_id)
        .bind(page.kind.as_str())
        .bind(&page.content)
        .bind(page.published)
        .bind(page.created_at)
        .bind(page.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }
}
