//! Scan import and scan-import-intent repository (spec.md §4.4 helpers:
//! `insert_scan_import`, `update_scan_import_counts`,
//! `update_scan_import_source_metadata`, `insert_scan_import_intent`).

use nmaptracker_models::error::Result;
use nmaptracker_models::import::ScanImport;
use nmaptracker_models::intent::ScanImportIntent;
use sqlx::SqliteExecutor;

pub async fn insert_scan_import<'e>(exec: impl SqliteExecutor<'e>, import: &ScanImport) -> Result<()> {
    sqlx::query(
        "INSERT INTO scan_imports
            (id, project_id, filename, import_time, hosts_found, ports_found,
             nmap_args, scanner_label, source_ip, source_port, source_port_raw)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&import.id)
    .bind(&import.project_id)
    .bind(&import.filename)
    .bind(&import.import_time)
    .bind(import.hosts_found)
    .bind(import.ports_found)
    .bind(&import.nmap_args)
    .bind(&import.scanner_label)
    .bind(&import.source_ip)
    .bind(import.source_port)
    .bind(&import.source_port_raw)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn get_by_id<'e>(exec: impl SqliteExecutor<'e>, project_id: &str, id: &str) -> Result<Option<ScanImport>> {
    Ok(sqlx::query_as::<_, ScanImport>("SELECT * FROM scan_imports WHERE project_id = ? AND id = ?")
        .bind(project_id)
        .bind(id)
        .fetch_optional(exec)
        .await?)
}

pub async fn list_by_project<'e>(exec: impl SqliteExecutor<'e>, project_id: &str) -> Result<Vec<ScanImport>> {
    Ok(
        sqlx::query_as::<_, ScanImport>("SELECT * FROM scan_imports WHERE project_id = ? ORDER BY import_time ASC")
            .bind(project_id)
            .fetch_all(exec)
            .await?,
    )
}

pub async fn update_counts<'e>(
    exec: impl SqliteExecutor<'e>,
    id: &str,
    hosts_found: i64,
    ports_found: i64,
) -> Result<()> {
    sqlx::query("UPDATE scan_imports SET hosts_found = ?, ports_found = ? WHERE id = ?")
        .bind(hosts_found)
        .bind(ports_found)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Write back the run-level args and the resolved source IP/port (spec.md
/// §4.5 step 3). `source_port` is `None` whenever the raw token failed to
/// parse as `1..=65535`; `source_port_raw` preserves it regardless.
pub async fn update_source_metadata<'e>(
    exec: impl SqliteExecutor<'e>,
    id: &str,
    nmap_args: Option<&str>,
    source_ip: Option<&str>,
    source_port: Option<i64>,
    source_port_raw: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE scan_imports SET nmap_args = ?, source_ip = ?, source_port = ?, source_port_raw = ? WHERE id = ?",
    )
    .bind(nmap_args)
    .bind(source_ip)
    .bind(source_port)
    .bind(source_port_raw)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM scan_imports WHERE id = ?").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_intent<'e>(exec: impl SqliteExecutor<'e>, intent: &ScanImportIntent) -> Result<()> {
    sqlx::query("INSERT INTO scan_import_intents (scan_import_id, intent, source, confidence) VALUES (?, ?, ?, ?)")
        .bind(&intent.scan_import_id)
        .bind(&intent.intent)
        .bind(&intent.source)
        .bind(intent.confidence)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn list_intents_by_import<'e>(
    exec: impl SqliteExecutor<'e>,
    scan_import_id: &str,
) -> Result<Vec<ScanImportIntent>> {
    Ok(sqlx::query_as::<_, ScanImportIntent>("SELECT * FROM scan_import_intents WHERE scan_import_id = ?")
        .bind(scan_import_id)
        .fetch_all(exec)
        .await?)
}

pub async fn delete_intents_by_import<'e>(exec: impl SqliteExecutor<'e>, scan_import_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM scan_import_intents WHERE scan_import_id = ?")
        .bind(scan_import_id)
        .execute(exec)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_test;
    use crate::repo::projects;
    use nmaptracker_models::intent::{IntentKind, IntentSource};
    use nmaptracker_models::project::Project;

    #[tokio::test]
    async fn test_scan_import_and_intent_roundtrip() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();

        let import = ScanImport::new(project.id.clone(), "scan.xml".to_string(), Some("nmap".to_string()));
        insert_scan_import(&pool, &import).await.unwrap();

        update_counts(&pool, &import.id, 1, 1).await.unwrap();
        update_source_metadata(&pool, &import.id, Some("nmap -sS 10.0.0.1"), Some("10.0.0.9"), Some(4444), None)
            .await
            .unwrap();

        let fetched = get_by_id(&pool, &project.id, &import.id).await.unwrap().unwrap();
        assert_eq!(fetched.hosts_found, 1);
        assert_eq!(fetched.source_ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(fetched.source_port, Some(4444));

        let intent = ScanImportIntent::new(import.id.clone(), IntentKind::Top1kTcp, IntentSource::Auto, 0.85);
        insert_intent(&pool, &intent).await.unwrap();
        let intents = list_intents_by_import(&pool, &import.id).await.unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].intent, "top_1k_tcp");

        delete_intents_by_import(&pool, &import.id).await.unwrap();
        assert!(list_intents_by_import(&pool, &import.id).await.unwrap().is_empty());

        assert_eq!(list_by_project(&pool, &project.id).await.unwrap().len(), 1);
    }
}
