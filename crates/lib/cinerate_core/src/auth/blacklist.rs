//! Revoked-token blacklist.
//!
//! Holds tokens invalidated by logout until their natural expiry. Tokens are
//! keyed by SHA-256 digest; the raw bearer string is never retained.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Concurrent set of revoked tokens, each entry living until the token's own expiry.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    entries: DashMap<String, DateTime<Utc>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Revoke `token` until `expires_at`. Revoking twice is a no-op.
    pub fn revoke(&self, token: &str, expires_at: DateTime<Utc>) {
        self.revoke_at(token, expires_at, Utc::now());
    }

    /// Revoke relative to an explicit clock. Returns `false` when the token
    /// has already expired and no entry was stored.
    pub fn revoke_at(&self, token: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if now > expires_at {
            debug!("skipping blacklist entry for expired token");
            return false;
        }
        self.entries.insert(token_key(token), expires_at);
        true
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.is_revoked_at(token, Utc::now())
    }

    /// Whether `token` is blocked at `now`. Entries past their expiry read as absent.
    pub fn is_revoked_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .get(&token_key(token))
            .is_some_and(|expires_at| now <= *expires_at)
    }

    /// Drop entries whose token has expired. Returns the number removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| now <= *expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SHA-256 hex digest used as the blacklist key.
fn token_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;

    #[test]
    fn revoked_token_is_visible_immediately() {
        let blacklist = TokenBlacklist::new();
        let exp = Utc::now() + Duration::minutes(10);
        assert!(!blacklist.is_revoked("tok"));
        blacklist.revoke("tok", exp);
        assert!(blacklist.is_revoked("tok"));
        assert!(!blacklist.is_revoked("other"));
    }

    #[test]
    fn revoke_is_idempotent() {
        let blacklist = TokenBlacklist::new();
        let exp = Utc::now() + Duration::minutes(10);
        blacklist.revoke("tok", exp);
        blacklist.revoke("tok", exp);
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_revoked("tok"));
    }

    #[test]
    fn expired_token_is_not_stored() {
        let blacklist = TokenBlacklist::new();
        let now = Utc::now();
        assert!(!blacklist.revoke_at("tok", now - Duration::seconds(1), now));
        assert!(blacklist.is_empty());
    }

    #[test]
    fn entry_lapses_at_token_expiry() {
        let blacklist = TokenBlacklist::new();
        let now = Utc::now();
        let exp = now + Duration::minutes(5);
        blacklist.revoke_at("tok", exp, now);
        assert!(blacklist.is_revoked_at("tok", exp));
        assert!(!blacklist.is_revoked_at("tok", exp + Duration::seconds(1)));
    }

    #[test]
    fn prune_removes_only_expired_entries() {
        let blacklist = TokenBlacklist::new();
        let now = Utc::now();
        blacklist.revoke_at("short", now + Duration::minutes(1), now);
        blacklist.revoke_at("long", now + Duration::minutes(30), now);
        assert_eq!(blacklist.prune(now + Duration::minutes(2)), 1);
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_revoked_at("long", now + Duration::minutes(2)));
    }

    #[test]
    fn keys_do_not_retain_raw_token() {
        let blacklist = TokenBlacklist::new();
        blacklist.revoke("secret-token", Utc::now() + Duration::minutes(1));
        assert!(blacklist.entries.iter().all(|e| !e.key().contains("secret")));
    }

    #[test]
    fn concurrent_revocations_are_all_visible() {
        let blacklist = Arc::new(TokenBlacklist::new());
        let exp = Utc::now() + Duration::minutes(10);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let blacklist = Arc::clone(&blacklist);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let token = format!("tok-{}", i % 50);
                        blacklist.revoke(&token, exp);
                        assert!(blacklist.is_revoked(&token));
                        let _ = blacklist.is_revoked(&format!("probe-{t}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(blacklist.len(), 50);
    }
}
