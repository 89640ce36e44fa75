//! Host observation repository. Append-only: no update function exists by
//! design (spec.md §3 invariant 3) — rows are only ever inserted or
//! cascaded away with their parent import.

use nmaptracker_models::error::Result;
use nmaptracker_models::observation::HostObservation;
use sqlx::SqliteExecutor;

pub async fn insert<'e>(exec: impl SqliteExecutor<'e>, obs: &HostObservation) -> Result<()> {
    sqlx::query(
        "INSERT INTO host_observations (id, scan_import_id, project_id, ip_address, hostname, in_scope, host_state)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&obs.id)
    .bind(&obs.scan_import_id)
    .bind(&obs.project_id)
    .bind(&obs.ip_address)
    .bind(&obs.hostname)
    .bind(obs.in_scope)
    .bind(&obs.host_state)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_by_import<'e>(exec: impl SqliteExecutor<'e>, scan_import_id: &str) -> Result<Vec<HostObservation>> {
    Ok(sqlx::query_as::<_, HostObservation>("SELECT * FROM host_observations WHERE scan_import_id = ?")
        .bind(scan_import_id)
        .fetch_all(exec)
        .await?)
}

pub async fn list_by_project<'e>(exec: impl SqliteExecutor<'e>, project_id: &str) -> Result<Vec<HostObservation>> {
    Ok(sqlx::query_as::<_, HostObservation>("SELECT * FROM host_observations WHERE project_id = ?")
        .bind(project_id)
        .fetch_all(exec)
        .await?)
}

/// Every import id that observed `ip_address` tagged with any of the
/// given intents, used by coverage/gap analytics. Joins through
/// `scan_import_intents`.
pub async fn list_import_ids_observing_ip_with_intents<'e>(
    exec: impl SqliteExecutor<'e>,
    project_id: &str,
    ip_address: &str,
    intents: &[String],
) -> Result<Vec<String>> {
    if intents.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = intents.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let sql = format!(
        "SELECT DISTINCT ho.scan_import_id FROM host_observations ho
         JOIN scan_import_intents sii ON sii.scan_import_id = ho.scan_import_id
         WHERE ho.project_id = ? AND ho.ip_address = ? AND sii.intent IN ({placeholders})"
    );
    let mut query = sqlx::query_scalar::<_, String>(&sql).bind(project_id).bind(ip_address);
    for intent in intents {
        query = query.bind(intent);
    }
    Ok(query.fetch_all(exec).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_test;
    use crate::repo::{imports, projects};
    use nmaptracker_models::import::ScanImport;
    use nmaptracker_models::intent::{IntentKind, IntentSource, ScanImportIntent};
    use nmaptracker_models::project::Project;

    #[tokio::test]
    async fn test_host_observation_insert_and_intent_join() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();

        let import = ScanImport::new(project.id.clone(), "scan.xml".to_string(), None);
        imports::insert_scan_import(&pool, &import).await.unwrap();
        let intent = ScanImportIntent::new(import.id.clone(), IntentKind::PingSweep, IntentSource::Auto, 0.98);
        imports::insert_intent(&pool, &intent).await.unwrap();

        let obs = HostObservation::new(import.id.clone(), project.id.clone(), "10.0.0.1".to_string(), None, true, "up".to_string());
        insert(&pool, &obs).await.unwrap();

        assert_eq!(list_by_import(&pool, &import.id).await.unwrap().len(), 1);
        assert_eq!(list_by_project(&pool, &project.id).await.unwrap().len(), 1);

        let hits = list_import_ids_observing_ip_with_intents(
            &pool,
            &project.id,
            "10.0.0.1",
            &["ping_sweep".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(hits, vec![import.id.clone()]);

        let misses = list_import_ids_observing_ip_with_intents(
            &pool,
            &project.id,
            "10.0.0.1",
            &["all_tcp".to_string()],
        )
        .await
        .unwrap();
        assert!(misses.is_empty());
    }
}
