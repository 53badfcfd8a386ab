//! Authentication service: login, logout and account lifecycle.

use std::collections::BTreeSet;

use chrono::Utc;
use cinerate_core::auth::password::hash_password;
use cinerate_core::auth::{AuthError, Role};
use cinerate_core::models::auth::AuthenticatedIdentity;
use cinerate_core::store::StoreError;
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{MessageResponse, TokenResponse};

/// Trim a required text field; `None` when missing or blank.
fn required(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Session tokens
// ---------------------------------------------------------------------------

/// Verify credentials and issue an access token.
pub async fn login(
    state: &AppState,
    username: Option<&str>,
    password: Option<&str>,
) -> AppResult<TokenResponse> {
    let (Some(username), Some(password)) = (required(username), password.filter(|p| !p.is_empty()))
    else {
        return Err(AppError::Validation("Username and password are required".into()));
    };

    let identity = state.authenticator.authenticate(username, password).await?;
    let token = state.tokens.encode(&identity.username, &identity.roles, Utc::now())?;

    info!(username = %identity.username, "user logged in");
    Ok(TokenResponse { token })
}

/// Revoke `token` until it would have expired anyway.
///
/// The request filter has already rejected invalid, expired and revoked
/// tokens, so decoding here only fails on a race with expiry.
pub fn logout(state: &AppState, token: &str) -> AppResult<MessageResponse> {
    let claims = state.tokens.decode(token)?;
    state.blacklist.revoke(token, claims.expires_at());
    info!(username = %claims.sub, "user logged out");
    Ok(MessageResponse::new("Logged out successfully"))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Create a plain `USER` account.
pub async fn register(
    state: &AppState,
    username: Option<&str>,
    password: Option<&str>,
) -> AppResult<MessageResponse> {
    let (Some(username), Some(password)) = (required(username), password.filter(|p| !p.is_empty()))
    else {
        return Err(AppError::Validation("Username and password are required".into()));
    };

    let password_hash = hash_password(password)?;
    let roles = BTreeSet::from([Role::User]);
    let id = state
        .stores
        .users
        .create(username, &password_hash, &roles)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Validation("User already exists!".into()),
            other => AppError::from(other),
        })?;

    info!(username, id, "user registered");
    Ok(MessageResponse::new("User registered successfully!"))
}

/// Delete account `id`. Callers may delete themselves; admins may delete anyone.
pub async fn delete_user(
    state: &AppState,
    caller: &AuthenticatedIdentity,
    id: i64,
) -> AppResult<MessageResponse> {
    let Some(target) = state.stores.users.find_by_id(id).await? else {
        return Err(AppError::NotFound(format!("User with ID {id} not found")));
    };

    if target.username != caller.username && !caller.is_admin() {
        return Err(AuthError::AccessDenied("You can only delete your own account".into()).into());
    }

    if !state.stores.users.delete(id).await? {
        return Err(AppError::NotFound(format!("User with ID {id} not found")));
    }

    info!(deleted = %target.username, by = %caller.username, "user deleted");
    Ok(MessageResponse::new("User deleted successfully!"))
}
