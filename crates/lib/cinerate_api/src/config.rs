//! API server configuration.

use cinerate_core::auth::jwt::{DEFAULT_TOKEN_VALIDITY_MINS, resolve_jwt_secret};

/// Default interval between blacklist prune passes: 1 minute.
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 60;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Lifetime of issued access tokens, in minutes.
    pub token_validity_mins: i64,
    /// Seconds between blacklist prune passes.
    pub prune_interval_secs: u64,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                                  |
    /// |--------------------------|------------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:8080`                         |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/cinerate`     |
    /// | `JWT_SECRET`             | generated & persisted to file            |
    /// | `TOKEN_VALIDITY_MINUTES` | `30`                                     |
    /// | `BLACKLIST_PRUNE_SECS`   | `60`                                     |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/cinerate".into()),
            jwt_secret: resolve_jwt_secret(),
            token_validity_mins: env_number("TOKEN_VALIDITY_MINUTES")
                .unwrap_or(DEFAULT_TOKEN_VALIDITY_MINS),
            prune_interval_secs: env_number("BLACKLIST_PRUNE_SECS")
                .unwrap_or(DEFAULT_PRUNE_INTERVAL_SECS),
        }
    }

    /// Fixed configuration for tests and embedding.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            jwt_secret: jwt_secret.into(),
            token_validity_mins: DEFAULT_TOKEN_VALIDITY_MINS,
            prune_interval_secs: DEFAULT_PRUNE_INTERVAL_SECS,
        }
    }
}

/// Parse a positive number from an env var; missing or invalid values yield `None`.
fn env_number<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}
