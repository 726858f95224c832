// Role hierarchy and access predicates
pub mod page_filter;

pub use page_filter::filter_page_by_role;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User roles with an explicit total order. Comparisons follow declaration
/// order, so `Role::Admin >= Role::ProUser` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Public,
    FreeUser,
    ProUser,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn level(&self) -> u8 {
        match self {
            Role::Public => 0,
            Role::FreeUser => 1,
            Role::ProUser => 2,
            Role::Admin => 3,
            Role::SuperAdmin => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::FreeUser => "free_user",
            Role::ProUser => "pro_user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Role::Public),
            "free_user" => Ok(Role::FreeUser),
            "pro_user" => Ok(Role::ProUser),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// Capability check for access-control nodes.
///
/// An empty `allowed_roles` list means the node is public. Admin and
/// SuperAdmin always pass. Everyone else must literally appear in the list;
/// a missing role is treated as `Public`.
pub fn has_access(role: Option<Role>, allowed_roles: &[String]) -> bool {
    if let Some(r) = role {
        if r.is_admin() {
            return true;
        }
    }

    if allowed_roles.is_empty() {
        return true;
    }

    let effective = role.unwrap_or(Role::Public);
    allowed_roles.iter().any(|allowed| allowed == effective.as_str())
}

/// Lowest-level role named in `allowed_roles`, used to tell a locked-out
/// viewer what tier unlocks the node. Unknown role strings are skipped.
pub fn minimum_required_role(allowed_roles: &[String]) -> Role {
    allowed_roles
        .iter()
        .filter_map(|s| Role::from_str(s).ok())
        .min()
        .unwrap_or(Role::ProUser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Public < Role::FreeUser);
        assert!(Role::FreeUser < Role::ProUser);
        assert!(Role::ProUser < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert_eq!(Role::SuperAdmin.level(), 4);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Public, Role::FreeUser, Role::ProUser, Role::Admin, Role::SuperAdmin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_empty_allowed_roles_is_public() {
        assert!(has_access(None, &[]));
        assert!(has_access(Some(Role::FreeUser), &[]));
    }

    #[test]
    fn test_admins_always_pass() {
        let allowed = vec!["pro_user".to_string()];
        assert!(has_access(Some(Role::Admin), &allowed));
        assert!(has_access(Some(Role::SuperAdmin), &allowed));
    }

    #[test]
    fn test_literal_membership() {
        let allowed = vec!["free_user".to_string(), "pro_user".to_string()];
        assert!(has_access(Some(Role::FreeUser), &allowed));
        assert!(has_access(Some(Role::ProUser), &allowed));
        assert!(!has_access(Some(Role::Public), &allowed));
        assert!(!has_access(None, &allowed));
    }

    #[test]
    fn test_minimum_required_role() {
        let allowed = vec!["pro_user".to_string(), "free_user".to_string()];
        assert_eq!(minimum_required_role(&allowed), Role::FreeUser);
        assert_eq!(minimum_required_role(&[]), Role::ProUser);
        assert_eq!(minimum_required_role(&["bogus".to_string()]), Role::ProUser);
    }
}
