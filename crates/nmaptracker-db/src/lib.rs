//! SQLite-backed store (C4) via sqlx: pool/pragmas, migrations, the
//! `ip_int` backfill, and schema-aware repository helpers for every
//! entity in the data model.

pub mod migrate;
pub mod pool;
pub mod repo;

pub use migrate::run_migrations;
pub use pool::{create_pool, open, open_test};
