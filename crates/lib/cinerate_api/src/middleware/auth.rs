//! Request authentication filter: bearer token resolution and access policy enforcement.
//!
//! Runs once per request, before any handler. Resolves the caller to a
//! [`Principal`], rejects invalid, expired or revoked tokens and tokens whose
//! user no longer exists with 401, then
//! evaluates the access policy (401 for anonymous callers, 403 for
//! authenticated callers lacking a role). Handlers read the resolved caller
//! through [`CurrentUser`] and never inspect tokens themselves.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use cinerate_core::auth::AuthError;
use cinerate_core::models::auth::{AuthenticatedIdentity, Principal};
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::policy::{Decision, DenyReason};

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, not valid UTF-8, uses another
/// scheme or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from request headers.
///
/// The token's subject is looked up on every request, so deleting an
/// account ends its sessions and role changes apply to tokens already issued.
pub async fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, AppError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(Principal::Anonymous);
    };

    let claims = state.tokens.decode(token).map_err(|e| {
        debug!(error = %e, "rejecting bearer token");
        AppError::from(e)
    })?;

    if state.blacklist.is_revoked(token) {
        debug!(username = %claims.sub, "rejecting revoked token");
        return Err(AuthError::Revoked.into());
    }

    let Some(credential) = state.stores.users.find_by_username(&claims.sub).await? else {
        debug!(username = %claims.sub, "rejecting token for unknown user");
        return Err(AuthError::UnknownSubject.into());
    };

    Ok(Principal::Authenticated(AuthenticatedIdentity {
        username: credential.username,
        roles: credential.roles,
    }))
}

/// Axum middleware: resolves the caller, enforces the access policy, and
/// injects the [`Principal`] into request extensions.
pub async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = resolve_principal(&state, request.headers()).await?;

    match state
        .policy
        .authorize(request.method(), request.uri().path(), &principal)
    {
        Decision::Allow => {}
        Decision::Deny(DenyReason::Unauthenticated) => {
            debug!(method = %request.method(), path = request.uri().path(), "authentication required");
            return Err(AppError::Unauthorized("Authentication required".into()));
        }
        Decision::Deny(DenyReason::Forbidden) => {
            debug!(method = %request.method(), path = request.uri().path(), "insufficient role");
            return Err(AppError::Forbidden("Access denied".into()));
        }
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// The authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Authenticated(identity)) => Ok(CurrentUser(identity.clone())),
            _ => Err(AppError::Unauthorized("Authentication required".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_requires_bearer_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("bearer abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
