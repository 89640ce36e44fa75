//! Port observation repository. Append-only, same discipline as
//! `repo::host_observations`.

use nmaptracker_models::error::Result;
use nmaptracker_models::observation::PortObservation;
use sqlx::SqliteExecutor;

pub async fn insert<'e>(exec: impl SqliteExecutor<'e>, obs: &PortObservation) -> Result<()> {
    sqlx::query(
        "INSERT INTO port_observations
            (id, scan_import_id, project_id, ip_address, port_number, protocol, state,
             service, version, product, extra_info, script_output)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&obs.id)
    .bind(&obs.scan_import_id)
    .bind(&obs.project_id)
    .bind(&obs.ip_address)
    .bind(obs.port_number)
    .bind(&obs.protocol)
    .bind(&obs.state)
    .bind(&obs.service)
    .bind(&obs.version)
    .bind(&obs.product)
    .bind(&obs.extra_info)
    .bind(&obs.script_output)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_by_import<'e>(exec: impl SqliteExecutor<'e>, scan_import_id: &str) -> Result<Vec<PortObservation>> {
    Ok(sqlx::query_as::<_, PortObservation>("SELECT * FROM port_observations WHERE scan_import_id = ?")
        .bind(scan_import_id)
        .fetch_all(exec)
        .await?)
}

pub async fn list_exposures_by_import<'e>(
    exec: impl SqliteExecutor<'e>,
    scan_import_id: &str,
) -> Result<Vec<PortObservation>> {
    Ok(sqlx::query_as::<_, PortObservation>(
        "SELECT * FROM port_observations WHERE scan_import_id = ? AND (state = 'open' OR state = 'open|filtered')",
    )
    .bind(scan_import_id)
    .fetch_all(exec)
    .await?)
}
