//! Schema setup for the PostgreSQL store.
//!
//! The `users`, `movies` and `ratings` tables are created by the SQL files in
//! `migrations/`, compiled into the binary. The in-memory store needs none.

use sqlx::PgPool;

/// Bring the catalog schema up to date. Already-applied migrations are skipped.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
