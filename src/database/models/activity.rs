use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Activity type recorded for every finder search; its payload doubles as
/// the lookup cache for repeat searches.
pub const ACTIVITY_EMAIL_FIND: &str = "email_find";

pub const EVENT_ROLE_CHANGE: &str = "role_change";
pub const EVENT_CREDIT_ADJUSTMENT: &str = "credit_adjustment";
pub const EVENT_PROFILE_UPDATE: &str = "profile_update";

/// Append-only audit/activity log row. `fingerprint` keys repeat lookups
/// for finder searches; other activity types leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub fingerprint: Option<String>,
    pub payload: Value,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

impl UserActivity {
    pub fn email_find(user_id: Uuid, fingerprint: String, payload: Value, success: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            activity_type: ACTIVITY_EMAIL_FIND.to_string(),
            fingerprint: Some(fingerprint),
            payload,
            success,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event: String,
    pub detail: Value,
    pub created_at: DateTime<Utc>,
}

impl UserHistory {
    pub fn new(user_id: Uuid, event: &str, detail: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event: event.to_string(),
            detail,
            created_at: Utc::now(),
        }
    }
}

/// Per-feature counter scoped to a calendar month. Rows are keyed by
/// `period` ("YYYY-MM"), so a new month starts at zero without any reset
/// job ever running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureUsage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub feature: String,
    pub period: String,
    pub used: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureUsage {
    pub fn new(user_id: Uuid, feature: &str, period: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            feature: feature.to_string(),
            period: period.to_string(),
            used: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current usage period, e.g. "2025-07".
pub fn current_period() -> String {
    Utc::now().format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_format() {
        let period = current_period();
        assert_eq!(period.len(), 7);
        assert_eq!(period.as_bytes()[4], b'-');
    }

    #[test]
    fn test_email_find_activity() {
        let user_id = Uuid::new_v4();
        let activity = UserActivity::email_find(
            user_id,
            "abc123".to_string(),
            serde_json::json!({"email": "a@b.c"}),
            true,
        );
        assert_eq!(activity.activity_type, ACTIVITY_EMAIL_FIND);
        assert_eq!(activity.fingerprint.as_deref(), Some("abc123"));
        assert!(activity.success);
    }
}
