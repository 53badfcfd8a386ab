//! Credential hashing for registration and login.
//!
//! Stored hashes are self-describing bcrypt strings, so accounts created
//! under an older cost keep verifying after the cost changes.

use super::AuthError;

/// Work factor for new hashes. Login verifies one hash per request on the
/// request task, and cost 10 keeps that to tens of milliseconds.
const BCRYPT_COST: u32 = 10;

/// Hash a new account's password for `UserStore::create`.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("password hash failed: {e}")))
}

/// Check a login attempt against the stored hash. A corrupt stored hash is an
/// internal error, not a failed login.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, stored_hash)
        .map_err(|e| AuthError::Internal(format!("stored password hash unreadable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("admin").unwrap();
        assert_ne!(hash, "admin");
        assert!(verify_password("admin", &hash).unwrap());
        assert!(!verify_password("Admin", &hash).unwrap());
    }

    #[test]
    fn invalid_hash_is_an_error() {
        assert!(matches!(
            verify_password("admin", "not-a-bcrypt-hash"),
            Err(AuthError::Internal(_))
        ));
    }
}
