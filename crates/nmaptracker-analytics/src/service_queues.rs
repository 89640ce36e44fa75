//! Service campaign queues (spec.md §4.6): per-service lists of open ports
//! on in-scope hosts, for working a target list service-by-service.

use std::collections::BTreeMap;

use nmaptracker_db::repo::{hosts, ports};
use nmaptracker_models::error::Result;
use sqlx::SqlitePool;

use crate::ordering::ip_cmp;
use crate::types::{ServicePortEntry, ServiceQueue};

/// Ports with no identified service are grouped under this label rather
/// than dropped, so every open port is accounted for in exactly one queue.
const UNKNOWN_SERVICE: &str = "unknown";

pub async fn service_queues(pool: &SqlitePool, project_id: &str) -> Result<Vec<ServiceQueue>> {
    let in_scope_hosts = hosts::list_in_scope_by_project(pool, project_id).await?;

    let mut by_service: BTreeMap<String, Vec<ServicePortEntry>> = BTreeMap::new();
    for host in &in_scope_hosts {
        for port in ports::list_open_by_host(pool, &host.id).await? {
            if !port.is_exposure() {
                continue;
            }
            let service = port.service.clone().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| UNKNOWN_SERVICE.to_string());
            by_service.entry(service.clone()).or_default().push(ServicePortEntry {
                host_id: host.id.clone(),
                ip_address: host.ip_address.clone(),
                port_id: port.id,
                port_number: port.port_number,
                protocol: port.protocol,
                service,
            });
        }
    }

    let mut queues: Vec<ServiceQueue> = by_service
        .into_iter()
        .map(|(service, mut ports)| {
            ports.sort_by(|a, b| ip_cmp(&a.ip_address, &b.ip_address).then(a.port_number.cmp(&b.port_number)));
            ServiceQueue { service, ports }
        })
        .collect();
    queues.sort_by(|a, b| a.service.cmp(&b.service));
    Ok(queues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmaptracker_db::pool::open_test;
    use nmaptracker_db::repo::{hosts as host_repo, ports as port_repo, projects};
    use nmaptracker_models::host::Host;
    use nmaptracker_models::port::Port;
    use nmaptracker_models::project::Project;

    #[tokio::test]
    async fn test_service_queues_groups_and_sorts() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();

        let mut host = Host::new(project.id.clone(), "10.0.0.1".to_string());
        host.in_scope = true;
        let host = host_repo::upsert(&pool, &host).await.unwrap();

        let mut ssh_port = Port::new(host.id.clone(), 22, "tcp".to_string(), "open".to_string(), "2026-01-01T00:00:00Z");
        ssh_port.service = Some("ssh".to_string());
        port_repo::upsert(&pool, &ssh_port).await.unwrap();

        let mut http_port = Port::new(host.id.clone(), 80, "tcp".to_string(), "open".to_string(), "2026-01-01T00:00:00Z");
        http_port.service = Some("http".to_string());
        port_repo::upsert(&pool, &http_port).await.unwrap();

        let unlabeled_port = Port::new(host.id.clone(), 9999, "tcp".to_string(), "open".to_string(), "2026-01-01T00:00:00Z");
        port_repo::upsert(&pool, &unlabeled_port).await.unwrap();

        let queues = service_queues(&pool, &project.id).await.unwrap();
        assert_eq!(queues.iter().map(|q| q.service.as_str()).collect::<Vec<_>>(), vec!["http", "ssh", "unknown"]);
    }
}
