//! Gap dashboard and milestone queues (spec.md §4.6).

use std::collections::HashSet;

use nmaptracker_db::repo::{host_observations, hosts, ports};
use nmaptracker_models::error::Result;
use nmaptracker_models::host::Host;
use sqlx::SqlitePool;

use crate::types::{GapReport, HostPortGroup, HostRef, MilestoneQueues, PortRef, Preview};

pub const GAP_PREVIEW_DEFAULT: usize = 10;
pub const GAP_PREVIEW_CAP: usize = 100;

fn href(host: &Host) -> HostRef {
    HostRef { host_id: host.id.clone(), ip_address: host.ip_address.clone() }
}

/// Intents satisfying each `needs_*` column, evaluated in strictest-first
/// order so a thorough scan also counts toward a shallower requirement.
const SATISFIES_PING_SWEEP: [&str; 3] = ["ping_sweep", "top_1k_tcp", "all_tcp"];
const SATISFIES_TOP_1K_TCP: [&str; 2] = ["top_1k_tcp", "all_tcp"];
const SATISFIES_ALL_TCP: [&str; 1] = ["all_tcp"];

struct NeedsLists {
    needs_ping_sweep: Vec<HostRef>,
    needs_top_1k_tcp: Vec<HostRef>,
    needs_all_tcp: Vec<HostRef>,
}

async fn compute_needs(pool: &SqlitePool, project_id: &str, in_scope_hosts: &[Host]) -> Result<NeedsLists> {
    let mut needs_ping_sweep = Vec::new();
    let mut needs_top_1k_tcp = Vec::new();
    let mut needs_all_tcp = Vec::new();

    for host in in_scope_hosts {
        let ping_hits = host_observations::list_import_ids_observing_ip_with_intents(
            pool,
            project_id,
            &host.ip_address,
            &SATISFIES_PING_SWEEP.map(String::from),
        )
        .await?;
        if ping_hits.is_empty() {
            needs_ping_sweep.push(href(host));
        }

        let top1k_hits = host_observations::list_import_ids_observing_ip_with_intents(
            pool,
            project_id,
            &host.ip_address,
            &SATISFIES_TOP_1K_TCP.map(String::from),
        )
        .await?;
        if top1k_hits.is_empty() {
            needs_top_1k_tcp.push(href(host));
        }

        let all_hits = host_observations::list_import_ids_observing_ip_with_intents(
            pool,
            project_id,
            &host.ip_address,
            &SATISFIES_ALL_TCP.map(String::from),
        )
        .await?;
        if all_hits.is_empty() {
            needs_all_tcp.push(href(host));
        }
    }

    Ok(NeedsLists { needs_ping_sweep, needs_top_1k_tcp, needs_all_tcp })
}

pub async fn gap(pool: &SqlitePool, project_id: &str, preview_size: usize, include_lists: bool) -> Result<GapReport> {
    let preview_size = preview_size.min(GAP_PREVIEW_CAP);
    let in_scope_hosts = hosts::list_in_scope_by_project(pool, project_id).await?;

    let ever_observed: HashSet<String> =
        host_observations::list_by_project(pool, project_id).await?.into_iter().map(|o| o.ip_address).collect();

    let mut never_scanned = Vec::new();
    let mut flagged_flat = Vec::new();
    let mut flagged_by_host = Vec::new();

    for host in &in_scope_hosts {
        if !ever_observed.contains(&host.ip_address) {
            never_scanned.push(href(host));
        }

        let open_ports = ports::list_open_by_host(pool, &host.id).await?;
        let mut group_ports = Vec::new();
        for port in open_ports {
            if port.work_status == "scanned" || port.work_status == "flagged" {
                let port_ref = PortRef {
                    host_id: host.id.clone(),
                    ip_address: host.ip_address.clone(),
                    port_id: port.id,
                    port_number: port.port_number,
                    protocol: port.protocol,
                };
                flagged_flat.push(port_ref.clone());
                group_ports.push(port_ref);
            }
        }
        if !group_ports.is_empty() {
            flagged_by_host.push(HostPortGroup { host: href(host), ports: group_ports });
        }
    }

    let needs = compute_needs(pool, project_id, &in_scope_hosts).await?;

    Ok(GapReport {
        in_scope_never_scanned: Preview::new(never_scanned, preview_size, include_lists),
        open_ports_scanned_or_flagged: Preview::new(flagged_flat, preview_size, include_lists),
        open_ports_scanned_or_flagged_by_host: flagged_by_host,
        needs_ping_sweep: Preview::new(needs.needs_ping_sweep, preview_size, include_lists),
        needs_top_1k_tcp: Preview::new(needs.needs_top_1k_tcp, preview_size, include_lists),
        needs_all_tcp: Preview::new(needs.needs_all_tcp, preview_size, include_lists),
    })
}

pub async fn milestones(pool: &SqlitePool, project_id: &str) -> Result<MilestoneQueues> {
    let in_scope_hosts = hosts::list_in_scope_by_project(pool, project_id).await?;
    let needs = compute_needs(pool, project_id, &in_scope_hosts).await?;
    Ok(MilestoneQueues {
        needs_ping_sweep: needs.needs_ping_sweep,
        needs_top_1k_tcp: needs.needs_top_1k_tcp,
        needs_all_tcp: needs.needs_all_tcp,
    })
}
