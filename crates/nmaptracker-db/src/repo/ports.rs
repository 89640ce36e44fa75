//! Port repository. Mirrors `repo::hosts`: upserts merge by `(host_id,
//! port_number, protocol)`, with non-empty-wins resolution done by the
//! caller before the values reach here.

use nmaptracker_models::error::Result;
use nmaptracker_models::port::Port;
use sqlx::SqliteExecutor;

pub async fn get_by_id<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<Option<Port>> {
    Ok(sqlx::query_as::<_, Port>("SELECT * FROM ports WHERE id = ?").bind(id).fetch_optional(exec).await?)
}

pub async fn get_by_host_port_protocol<'e>(
    exec: impl SqliteExecutor<'e>,
    host_id: &str,
    port_number: i64,
    protocol: &str,
) -> Result<Option<Port>> {
    Ok(sqlx::query_as::<_, Port>("SELECT * FROM ports WHERE host_id = ? AND port_number = ? AND protocol = ?")
        .bind(host_id)
        .bind(port_number)
        .bind(protocol)
        .fetch_optional(exec)
        .await?)
}

pub async fn list_by_host<'e>(exec: impl SqliteExecutor<'e>, host_id: &str) -> Result<Vec<Port>> {
    Ok(sqlx::query_as::<_, Port>("SELECT * FROM ports WHERE host_id = ? ORDER BY port_number ASC, protocol ASC")
        .bind(host_id)
        .fetch_all(exec)
        .await?)
}

pub async fn list_open_by_host<'e>(exec: impl SqliteExecutor<'e>, host_id: &str) -> Result<Vec<Port>> {
    Ok(sqlx::query_as::<_, Port>(
        "SELECT * FROM ports WHERE host_id = ? AND state = 'open' ORDER BY port_number ASC, protocol ASC",
    )
    .bind(host_id)
    .fetch_all(exec)
    .await?)
}

/// Every open port with `port_number` across a whole project, joined
/// through `hosts`. Backs the "mark all open ports with port N across the
/// project" bulk workflow operation (spec.md §4.7).
pub async fn list_open_by_project_and_port_number<'e>(
    exec: impl SqliteExecutor<'e>,
    project_id: &str,
    port_number: i64,
) -> Result<Vec<Port>> {
    Ok(sqlx::query_as::<_, Port>(
        "SELECT ports.* FROM ports
         JOIN hosts ON hosts.id = ports.host_id
         WHERE hosts.project_id = ? AND ports.port_number = ? AND ports.state = 'open'
         ORDER BY hosts.ip_int ASC, hosts.ip_address ASC",
    )
    .bind(project_id)
    .bind(port_number)
    .fetch_all(exec)
    .await?)
}

pub async fn upsert<'e>(exec: impl SqliteExecutor<'e>, port: &Port) -> Result<Port> {
    Ok(sqlx::query_as::<_, Port>(
        "INSERT INTO ports
            (id, host_id, port_number, protocol, state, service, version, product, extra_info,
             work_status, script_output, notes, last_seen, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(host_id, port_number, protocol) DO UPDATE SET
           state = excluded.state,
           service = excluded.service,
           version = excluded.version,
           product = excluded.product,
           extra_info = excluded.extra_info,
           work_status = excluded.work_status,
           script_output = excluded.script_output,
           notes = excluded.notes,
           last_seen = excluded.last_seen,
           updated_at = excluded.updated_at
         RETURNING *",
    )
    .bind(&port.id)
    .bind(&port.host_id)
    .bind(port.port_number)
    .bind(&port.protocol)
    .bind(&port.state)
    .bind(&port.service)
    .bind(&port.version)
    .bind(&port.product)
    .bind(&port.extra_info)
    .bind(&port.work_status)
    .bind(&port.script_output)
    .bind(&port.notes)
    .bind(&port.last_seen)
    .bind(&port.created_at)
    .bind(&port.updated_at)
    .fetch_one(exec)
    .await?)
}

pub async fn update_work_status<'e>(
    exec: impl SqliteExecutor<'e>,
    id: &str,
    work_status: &str,
    updated_at: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE ports SET work_status = ?, updated_at = ? WHERE id = ?")
        .bind(work_status)
        .bind(updated_at)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_notes<'e>(exec: impl SqliteExecutor<'e>, id: &str, notes: &str, updated_at: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE ports SET notes = ?, updated_at = ? WHERE id = ?")
        .bind(notes)
        .bind(updated_at)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM ports WHERE id = ?").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
}
