//! Database connection pool management and the C4 Store open procedure.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Open the store: connect (creating the file if missing), set operational
/// pragmas (busy timeout, foreign keys, WAL journaling), run migrations,
/// and backfill `ip_int` for any IPv4 host still missing it. Mirrors
/// spec.md §4.4's "open procedure" ordering exactly.
///
/// `url` should be a SQLite path like `sqlite:nmaptracker.db` or
/// `sqlite::memory:` for testing.
pub async fn open(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = create_pool(url).await?;
    crate::migrate::run_migrations(&pool).await?;
    Ok(pool)
}

/// Connect and apply pragmas without running migrations. Exposed
/// separately so tests can inspect pre-migration state; `open` is the
/// entry point application code should use.
pub async fn create_pool(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // A private in-memory database exists only for the connection that
    // opened it, so the pool must be pinned to a single connection or
    // later acquisitions would each see an empty database.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new().max_connections(max_connections).connect_with(opts).await
}

/// Open an in-memory store for testing, fully migrated.
pub async fn open_test() -> Result<SqlitePool, sqlx::Error> {
    open("sqlite::memory:").await
}
