//! Role definitions.
//!
//! Roles are persisted as a comma-separated list (`"USER,ADMIN"`) and carried
//! in tokens as an array of upper-case names.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named permission grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Catalog administrator.
    Admin,
    /// Regular registered user.
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    /// Parse a role name. Case-insensitive; a `ROLE_` prefix is accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let name = s
            .get(..5)
            .filter(|p| p.eq_ignore_ascii_case("ROLE_"))
            .map_or(s, |_| &s[5..]);
        match name.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a stored role list. Unknown names are skipped.
pub fn parse_role_list(raw: &str) -> BTreeSet<Role> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|name| {
            let role = Role::parse(name);
            if role.is_none() {
                warn!(role = name.trim(), "ignoring unknown stored role");
            }
            role
        })
        .collect()
}

/// Format a role set for storage.
pub fn format_role_list(roles: &BTreeSet<Role>) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefix_and_case() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(" role_user "), Some(Role::User));
        assert_eq!(Role::parse("ROLE_"), None);
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn role_list_skips_unknown_and_blank() {
        let roles = parse_role_list("USER, ADMIN,,guest");
        assert_eq!(roles, BTreeSet::from([Role::Admin, Role::User]));
    }

    #[test]
    fn role_list_format_is_stable() {
        let roles = BTreeSet::from([Role::User, Role::Admin]);
        assert_eq!(format_role_list(&roles), "ADMIN,USER");
        assert_eq!(parse_role_list(&format_role_list(&roles)), roles);
    }

    #[test]
    fn serializes_upper_case() {
        let json = serde_json::to_string(&vec![Role::Admin, Role::User]).unwrap();
        assert_eq!(json, r#"["ADMIN","USER"]"#);
    }
}
