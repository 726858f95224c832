// Core vocabulary for email finding and verification
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed status set. Every provider-specific status string is mapped into
/// this set before any application logic looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Valid,
    Invalid,
    Catchall,
    Unknown,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Valid => "valid",
            VerificationStatus::Invalid => "invalid",
            VerificationStatus::Catchall => "catchall",
            VerificationStatus::Unknown => "unknown",
        }
    }

    /// A usable result: deliverable, or at least accepted by a catch-all.
    pub fn is_match(&self) -> bool {
        matches!(self, VerificationStatus::Valid | VerificationStatus::Catchall)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generated candidate address. `priority` is the pattern index used for
/// tie-breaking: lower index wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCandidate {
    pub email: String,
    pub priority: usize,
}

/// Tri-state search outcome. Callers never have to tell "provider said no"
/// apart from "provider errored" by inspecting error types: both collapse
/// into `NotFound` where the contract calls for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderOutcome {
    FoundValid { email: String },
    FoundCatchall { email: String },
    NotFound,
}

impl FinderOutcome {
    pub fn email(&self) -> Option<&str> {
        match self {
            FinderOutcome::FoundValid { email } | FinderOutcome::FoundCatchall { email } => {
                Some(email)
            }
            FinderOutcome::NotFound => None,
        }
    }

    pub fn status(&self) -> Option<VerificationStatus> {
        match self {
            FinderOutcome::FoundValid { .. } => Some(VerificationStatus::Valid),
            FinderOutcome::FoundCatchall { .. } => Some(VerificationStatus::Catchall),
            FinderOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, FinderOutcome::NotFound)
    }
}

/// Orchestrator result: the outcome plus how many candidates were examined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub outcome: FinderOutcome,
    pub emails_checked: usize,
}

impl SearchOutcome {
    pub fn not_found(emails_checked: usize) -> Self {
        Self { outcome: FinderOutcome::NotFound, emails_checked }
    }
}

/// Result of asking the secondary provider to disambiguate a catch-all hit.
#[derive(Debug, Clone)]
pub struct CatchallResolution {
    pub email: Option<String>,
    pub status: VerificationStatus,
    pub certainty: Option<String>,
}
