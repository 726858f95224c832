use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The two page collections. Marketing pages are public but only served
/// once published; dashboard pages always require authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Marketing,
    Dashboard,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Marketing => "marketing",
            PageKind::Dashboard => "dashboard",
        }
    }
}

/// CMS page document. `content` holds the full page JSON including the
/// `sections` map the access filter walks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub page_id: String,
    pub kind: PageKind,
    pub content: Value,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(page_id: &str, kind: PageKind, content: Value, published: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            page_id: page_id.to_string(),
            kind,
            content,
            published,
            created_at: now,
            updated_at: now,
        }
    }
}
