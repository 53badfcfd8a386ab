//! # cinerate_core
//!
//! Core domain logic for Cinerate: token issuance and revocation, credential
//! checks, and the storage collaborators behind the HTTP API.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
