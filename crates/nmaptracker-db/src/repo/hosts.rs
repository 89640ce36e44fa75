//! Host repository. Upserts merge by `(project_id, ip_address)` — callers
//! (the Merge Engine) resolve non-empty-wins precedence before calling
//! [`upsert`]; this layer only ever writes the values it's handed.

use nmaptracker_models::error::Result;
use nmaptracker_models::host::Host;
use sqlx::SqliteExecutor;

pub async fn get_by_id<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<Option<Host>> {
    Ok(sqlx::query_as::<_, Host>("SELECT * FROM hosts WHERE id = ?").bind(id).fetch_optional(exec).await?)
}

pub async fn get_by_project_and_ip<'e>(
    exec: impl SqliteExecutor<'e>,
    project_id: &str,
    ip_address: &str,
) -> Result<Option<Host>> {
    Ok(
        sqlx::query_as::<_, Host>("SELECT * FROM hosts WHERE project_id = ? AND ip_address = ?")
            .bind(project_id)
            .bind(ip_address)
            .fetch_optional(exec)
            .await?,
    )
}

pub async fn list_by_project<'e>(exec: impl SqliteExecutor<'e>, project_id: &str) -> Result<Vec<Host>> {
    Ok(sqlx::query_as::<_, Host>("SELECT * FROM hosts WHERE project_id = ? ORDER BY ip_int ASC, ip_address ASC")
        .bind(project_id)
        .fetch_all(exec)
        .await?)
}

pub async fn list_in_scope_by_project<'e>(exec: impl SqliteExecutor<'e>, project_id: &str) -> Result<Vec<Host>> {
    Ok(sqlx::query_as::<_, Host>(
        "SELECT * FROM hosts WHERE project_id = ? AND in_scope = 1 ORDER BY ip_int ASC, ip_address ASC",
    )
    .bind(project_id)
    .fetch_all(exec)
    .await?)
}

/// Insert a new host or merge into the existing row for `(project_id,
/// ip_address)`, returning the row as it now stands (spec.md §4.4: "the
/// ON-CONFLICT branch must return the merged row").
pub async fn upsert<'e>(exec: impl SqliteExecutor<'e>, host: &Host) -> Result<Host> {
    Ok(sqlx::query_as::<_, Host>(
        "INSERT INTO hosts (id, project_id, ip_address, ip_int, hostname, os_guess, in_scope, latest_scan, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(project_id, ip_address) DO UPDATE SET
           hostname = excluded.hostname,
           os_guess = excluded.os_guess,
           in_scope = excluded.in_scope,
           notes = excluded.notes,
           updated_at = excluded.updated_at
         RETURNING *",
    )
    .bind(&host.id)
    .bind(&host.project_id)
    .bind(&host.ip_address)
    .bind(host.ip_int)
    .bind(&host.hostname)
    .bind(&host.os_guess)
    .bind(host.in_scope)
    .bind(&host.latest_scan)
    .bind(&host.notes)
    .bind(&host.created_at)
    .bind(&host.updated_at)
    .fetch_one(exec)
    .await?)
}

pub async fn update_latest_scan<'e>(exec: impl SqliteExecutor<'e>, id: &str, latest_scan: &str) -> Result<()> {
    sqlx::query("UPDATE hosts SET latest_scan = ? WHERE id = ?").bind(latest_scan).bind(id).execute(exec).await?;
    Ok(())
}

pub async fn update_notes<'e>(exec: impl SqliteExecutor<'e>, id: &str, notes: &str, updated_at: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE hosts SET notes = ?, updated_at = ? WHERE id = ?")
        .bind(notes)
        .bind(updated_at)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM hosts WHERE id = ?").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
}
