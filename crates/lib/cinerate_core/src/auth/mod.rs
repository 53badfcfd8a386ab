//! Authentication and authorization logic.
//!
//! Token signing and verification, the logout blacklist, password hashing
//! and credential checks. Shared by `cinerate_api` and the server binary.

pub mod authenticator;
pub mod blacklist;
pub mod jwt;
pub mod password;
pub mod roles;

use thiserror::Error;

use crate::store::StoreError;

pub use authenticator::Authenticator;
pub use blacklist::TokenBlacklist;
pub use jwt::TokenCodec;
pub use roles::Role;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token subject no longer exists")]
    UnknownSubject,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
