//! Coverage matrix (spec.md §4.6): rows are in-scope hosts, columns are the
//! fixed intent order, cell is observed/missing.

use nmaptracker_db::repo::{host_observations, hosts};
use nmaptracker_models::error::Result;
use nmaptracker_models::intent::IntentKind;
use sqlx::SqlitePool;

use crate::types::{CoverageMatrix, CoverageRow, HostRef};

pub async fn coverage(pool: &SqlitePool, project_id: &str) -> Result<CoverageMatrix> {
    let in_scope_hosts = hosts::list_in_scope_by_project(pool, project_id).await?;

    let mut rows = Vec::with_capacity(in_scope_hosts.len());
    for host in in_scope_hosts {
        let mut observed = [false; 5];
        for (i, intent) in IntentKind::COLUMN_ORDER.iter().enumerate() {
            let hits = host_observations::list_import_ids_observing_ip_with_intents(
                pool,
                project_id,
                &host.ip_address,
                &[intent.as_str().to_string()],
            )
            .await?;
            observed[i] = !hits.is_empty();
        }
        rows.push(CoverageRow { host: HostRef { host_id: host.id, ip_address: host.ip_address }, observed });
    }

    Ok(CoverageMatrix { columns: IntentKind::COLUMN_ORDER.iter().map(IntentKind::as_str).collect(), rows })
}
