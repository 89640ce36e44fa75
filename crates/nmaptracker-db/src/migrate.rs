//! Schema migration from embedded SQL files, plus the `ip_int` backfill
//! that completes the C4 Store open procedure (spec.md §4.4).

use nmaptracker_models::host::ipv4_to_int;
use sqlx::SqlitePool;

/// SQL statements for all 9 tables, applied in lexical filename order.
/// Migrations are forward-only and written with `IF NOT EXISTS` so
/// re-running them is a no-op.
const MIGRATIONS: &[(&str, &str)] = &[
    ("001_create_projects", include_str!("../../../migrations/sql/001_create_projects.sql")),
    ("002_create_scope_definitions", include_str!("../../../migrations/sql/002_create_scope_definitions.sql")),
    ("003_create_scan_imports", include_str!("../../../migrations/sql/003_create_scan_imports.sql")),
    ("004_create_scan_import_intents", include_str!("../../../migrations/sql/004_create_scan_import_intents.sql")),
    ("005_create_hosts", include_str!("../../../migrations/sql/005_create_hosts.sql")),
    ("006_create_ports", include_str!("../../../migrations/sql/006_create_ports.sql")),
    ("007_create_host_observations", include_str!("../../../migrations/sql/007_create_host_observations.sql")),
    ("008_create_port_observations", include_str!("../../../migrations/sql/008_create_port_observations.sql")),
    ("009_create_expected_asset_baselines", include_str!("../../../migrations/sql/009_create_expected_asset_baselines.sql")),
    ("010_normalize_legacy_work_status", include_str!("../../../migrations/sql/010_normalize_legacy_work_status.sql")),
];

/// Run all migrations, then backfill `ip_int` for IPv4 hosts (invariant 4,
/// spec.md §3). Called once from [`crate::pool::open`].
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (name, sql) in MIGRATIONS {
        tracing::debug!(migration = name, "running migration");
        sqlx::raw_sql(sql).execute(pool).await?;
    }
    tracing::info!(count = MIGRATIONS.len(), "all migrations applied");

    backfill_ip_int(pool).await?;
    Ok(())
}

async fn backfill_ip_int(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT id, ip_address FROM hosts WHERE ip_int IS NULL").fetch_all(pool).await?;

    let mut backfilled = 0u64;
    for (id, ip_address) in rows {
        if let Some(ip_int) = ipv4_to_int(&ip_address) {
            sqlx::query("UPDATE hosts SET ip_int = ? WHERE id = ?").bind(ip_int).bind(&id).execute(pool).await?;
            backfilled += 1;
        }
    }
    if backfilled > 0 {
        tracing::info!(backfilled, "ip_int backfill complete");
    }
    Ok(())
}
