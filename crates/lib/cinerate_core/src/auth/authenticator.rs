//! Username/password authentication against the credential store.

use std::sync::Arc;

use tracing::{debug, info};

use super::AuthError;
use super::password::verify_password;
use crate::models::auth::AuthenticatedIdentity;
use crate::store::UserStore;

/// Checks submitted credentials and resolves the caller's identity.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Verify `password` for `username`.
    ///
    /// An unknown user and a wrong password both yield
    /// [`AuthError::InvalidCredentials`], so callers cannot tell them apart.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let Some(credential) = self.users.find_by_username(username).await? else {
            debug!(username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &credential.password_hash)? {
            debug!(username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        info!(username, "credentials verified");
        Ok(AuthenticatedIdentity {
            username: credential.username,
            roles: credential.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::auth::Role;
    use crate::auth::password::hash_password;
    use crate::store::memory::MemoryStore;

    async fn authenticator() -> Authenticator {
        let store = Arc::new(MemoryStore::new());
        store
            .create(
                "user",
                &hash_password("admin").unwrap(),
                &BTreeSet::from([Role::User]),
            )
            .await
            .unwrap();
        Authenticator::new(store)
    }

    #[tokio::test]
    async fn valid_credentials_resolve_identity() {
        let identity = authenticator()
            .await
            .authenticate("user", "admin")
            .await
            .unwrap();
        assert_eq!(identity.username, "user");
        assert_eq!(identity.roles, BTreeSet::from([Role::User]));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let auth = authenticator().await;
        let unknown = auth.authenticate("ghost", "admin").await.unwrap_err();
        let wrong = auth.authenticate("user", "nope").await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }
}
