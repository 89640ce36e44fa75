//! Host read/write operations (spec.md §6:
//! `list_hosts_with_summary, get_host_by_id, list_ports, update_host_notes,
//! delete_host`).

use chrono::Utc;
use nmaptracker_db::repo::{hosts, ports};
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::host::Host;
use nmaptracker_models::port::Port;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default)]
pub struct HostFilters {
    pub in_scope: Option<bool>,
    pub latest_scan: Option<String>,
    /// Case-insensitive substring match against IP address or hostname.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSortField {
    IpAddress,
    Hostname,
    LatestScan,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy)]
pub struct HostSort {
    pub field: HostSortField,
    pub descending: bool,
}

impl Default for HostSort {
    fn default() -> Self {
        Self { field: HostSortField::IpAddress, descending: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

#[derive(Debug, Clone)]
pub struct HostSummary {
    pub host: Host,
    pub open_port_count: i64,
    pub total_port_count: i64,
}

pub async fn list_hosts_with_summary(
    pool: &SqlitePool,
    project_id: &str,
    filters: HostFilters,
    sort: HostSort,
    paging: Paging,
) -> Result<Vec<HostSummary>> {
    let mut all = hosts::list_by_project(pool, project_id).await?;

    if let Some(in_scope) = filters.in_scope {
        all.retain(|h| h.in_scope == in_scope);
    }
    if let Some(latest_scan) = &filters.latest_scan {
        all.retain(|h| &h.latest_scan == latest_scan);
    }
    if let Some(search) = filters.search.as_deref().map(str::to_lowercase) {
        all.retain(|h| {
            h.ip_address.to_lowercase().contains(&search)
                || h.hostname.as_deref().is_some_and(|name| name.to_lowercase().contains(&search))
        });
    }

    all.sort_by(|a, b| {
        let ordering = match sort.field {
            HostSortField::IpAddress => a.ip_int.cmp(&b.ip_int).then_with(|| a.ip_address.cmp(&b.ip_address)),
            HostSortField::Hostname => a.hostname.cmp(&b.hostname),
            HostSortField::LatestScan => a.latest_scan_enum().cmp(&b.latest_scan_enum()),
            HostSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        if sort.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });

    let page: Vec<Host> = all.into_iter().skip(paging.offset).take(paging.limit).collect();

    let mut summaries = Vec::with_capacity(page.len());
    for host in page {
        let host_ports = ports::list_by_host(pool, &host.id).await?;
        let open_port_count = host_ports.iter().filter(|p| p.is_open()).count() as i64;
        let total_port_count = host_ports.len() as i64;
        summaries.push(HostSummary { host, open_port_count, total_port_count });
    }
    Ok(summaries)
}

pub async fn get_host_by_id(pool: &SqlitePool, id: &str) -> Result<Host> {
    hosts::get_by_id(pool, id).await?.ok_or_else(|| TrackerError::NotFound(format!("host {id}")))
}

pub async fn list_ports(pool: &SqlitePool, host_id: &str) -> Result<Vec<Port>> {
    ports::list_by_host(pool, host_id).await
}

pub async fn update_host_notes(pool: &SqlitePool, id: &str, notes: &str) -> Result<()> {
    let updated_at = Utc::now().to_rfc3339();
    if !hosts::update_notes(pool, id, notes, &updated_at).await? {
        return Err(TrackerError::NotFound(format!("host {id}")));
    }
    Ok(())
}

pub async fn delete_host(pool: &SqlitePool, id: &str) -> Result<()> {
    if !hosts::delete(pool, id).await? {
        return Err(TrackerError::NotFound(format!("host {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmaptracker_db::pool::open_test;
    use nmaptracker_db::repo::{hosts as host_repo, projects};
    use nmaptracker_models::project::Project;

    #[tokio::test]
    async fn test_list_hosts_with_summary_filters_and_sorts() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();

        let mut a = Host::new(project.id.clone(), "10.0.0.5".to_string());
        a.in_scope = true;
        host_repo::upsert(&pool, &a).await.unwrap();
        let mut b = Host::new(project.id.clone(), "10.0.0.1".to_string());
        b.in_scope = true;
        host_repo::upsert(&pool, &b).await.unwrap();
        let mut c = Host::new(project.id.clone(), "10.0.0.9".to_string());
        c.in_scope = false;
        host_repo::upsert(&pool, &c).await.unwrap();

        let summaries = list_hosts_with_summary(
            &pool,
            &project.id,
            HostFilters { in_scope: Some(true), ..Default::default() },
            HostSort::default(),
            Paging::default(),
        )
        .await
        .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].host.ip_address, "10.0.0.1");
        assert_eq!(summaries[1].host.ip_address, "10.0.0.5");
    }

    #[tokio::test]
    async fn test_update_host_notes_and_delete() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();
        let host = host_repo::upsert(&pool, &Host::new(project.id.clone(), "10.0.0.1".to_string())).await.unwrap();

        update_host_notes(&pool, &host.id, "follow up on ssh").await.unwrap();
        assert_eq!(get_host_by_id(&pool, &host.id).await.unwrap().notes, "follow up on ssh");

        delete_host(&pool, &host.id).await.unwrap();
        assert!(matches!(get_host_by_id(&pool, &host.id).await.unwrap_err(), TrackerError::NotFound(_)));
    }
}
