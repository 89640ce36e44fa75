//! Port workflow operations (spec.md §4.7): the per-port status state
//! machine plus bulk mark-all mutations, each run inside one transaction.

use chrono::Utc;
use nmaptracker_db::repo::ports;
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::port::{Port, WorkStatus};
use sqlx::SqlitePool;

pub async fn update_port_notes(pool: &SqlitePool, id: &str, notes: &str) -> Result<()> {
    let updated_at = Utc::now().to_rfc3339();
    if !ports::update_notes(pool, id, notes, &updated_at).await? {
        return Err(TrackerError::NotFound(format!("port {id}")));
    }
    Ok(())
}

/// Transition one open port's work status. All transitions between the
/// closed state set are manual and idempotent (spec.md §4.7); the only
/// guard is that the port must currently be `open`.
pub async fn update_port_status(pool: &SqlitePool, port_id: &str, status: &str) -> Result<Port> {
    let new_status = WorkStatus::from_str(status)
        .ok_or_else(|| TrackerError::InvalidInput(format!("unknown work status: {status}")))?;
    let port = ports::get_by_id(pool, port_id).await?.ok_or_else(|| TrackerError::NotFound(format!("port {port_id}")))?;
    if !port.is_open() {
        return Err(TrackerError::WorkflowNotOnOpenPort);
    }
    let updated_at = Utc::now().to_rfc3339();
    ports::update_work_status(pool, port_id, new_status.as_str(), &updated_at).await?;
    ports::get_by_id(pool, port_id).await?.ok_or_else(|| TrackerError::NotFound(format!("port {port_id}")))
}

/// Mark every open port on `host_id` with `status`, atomically.
pub async fn mark_all_open_ports_for_host(pool: &SqlitePool, host_id: &str, status: &str) -> Result<u64> {
    let new_status = WorkStatus::from_str(status)
        .ok_or_else(|| TrackerError::InvalidInput(format!("unknown work status: {status}")))?;
    let mut tx = pool.begin().await?;
    let open_ports = ports::list_open_by_host(&mut *tx, host_id).await?;
    let updated_at = Utc::now().to_rfc3339();
    for port in &open_ports {
        ports::update_work_status(&mut *tx, &port.id, new_status.as_str(), &updated_at).await?;
    }
    tx.commit().await?;
    Ok(open_ports.len() as u64)
}

/// Mark every open port carrying `port_number` across the whole project
/// with `status`, atomically (the "mark all 443s" workflow shortcut).
pub async fn mark_all_open_ports_by_port_number(
    pool: &SqlitePool,
    project_id: &str,
    port_number: i64,
    status: &str,
) -> Result<u64> {
    let new_status = WorkStatus::from_str(status)
        .ok_or_else(|| TrackerError::InvalidInput(format!("unknown work status: {status}")))?;
    let mut tx = pool.begin().await?;
    let open_ports = ports::list_open_by_project_and_port_number(&mut *tx, project_id, port_number).await?;
    let updated_at = Utc::now().to_rfc3339();
    for port in &open_ports {
        ports::update_work_status(&mut *tx, &port.id, new_status.as_str(), &updated_at).await?;
    }
    tx.commit().await?;
    Ok(open_ports.len() as u64)
}

/// Mark an explicit, caller-supplied set of ports with `status`,
/// atomically. Grounds "the current host filter set" from spec.md §4.7:
/// the filter is evaluated by the caller (e.g. `hosts::list_hosts_with_summary`
/// followed by `list_ports`), this only performs the bulk mutation.
/// Fails the whole batch with **WorkflowNotOnOpenPort** if any named port
/// is not open, leaving every port untouched.
pub async fn mark_ports_by_id(pool: &SqlitePool, port_ids: &[String], status: &str) -> Result<u64> {
    let new_status = WorkStatus::from_str(status)
        .ok_or_else(|| TrackerError::InvalidInput(format!("unknown work status: {status}")))?;
    let mut tx = pool.begin().await?;
    let updated_at = Utc::now().to_rfc3339();
    for port_id in port_ids {
        let port =
            ports::get_by_id(&mut *tx, port_id).await?.ok_or_else(|| TrackerError::NotFound(format!("port {port_id}")))?;
        if !port.is_open() {
            return Err(TrackerError::WorkflowNotOnOpenPort);
        }
        ports::update_work_status(&mut *tx, port_id, new_status.as_str(), &updated_at).await?;
    }
    tx.commit().await?;
    Ok(port_ids.len() as u64)
}
