//! Authentication domain models.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Stored credential for a registered user.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: username (standard JWT `sub` claim).
    pub sub: String,
    /// User roles (e.g. `["ADMIN", "USER"]`).
    pub roles: BTreeSet<Role>,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Random per-token id; two sessions never share a token string.
    pub jti: String,
}

impl TokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Identity resolved for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl AuthenticatedIdentity {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Caller of a request: anonymous, or authenticated by a valid bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedIdentity),
}

impl Principal {
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }
}
