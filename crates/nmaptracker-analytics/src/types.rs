//! Output DTOs for the Analytics Engine (spec.md §4.6). None of these carry
//! behavior; they only exist to give the CLI/HTTP collaborators a stable
//! JSON shape via `serde`.

use serde::Serialize;

/// A lightweight reference to a host, used wherever a preview list or a
/// grouping key needs just enough to identify the row.
#[derive(Debug, Clone, Serialize)]
pub struct HostRef {
    pub host_id: String,
    pub ip_address: String,
}

/// A lightweight reference to a port, carrying its parent host's identity
/// so flat preview lists remain self-describing.
#[derive(Debug, Clone, Serialize)]
pub struct PortRef {
    pub host_id: String,
    pub ip_address: String,
    pub port_id: String,
    pub port_number: i64,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostPortGroup {
    pub host: HostRef,
    pub ports: Vec<PortRef>,
}

/// One row of the coverage matrix: a host and which fixed-order intent
/// columns have at least one observation.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageRow {
    pub host: HostRef,
    /// Parallel to [`nmaptracker_models::intent::IntentKind::COLUMN_ORDER`].
    pub observed: [bool; 5],
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageMatrix {
    pub columns: Vec<&'static str>,
    pub rows: Vec<CoverageRow>,
}

/// A preview list bundled with the true total so callers can tell a full
/// list from a truncated one (spec.md §4.6 "preview_size" semantics).
#[derive(Debug, Clone, Serialize)]
pub struct Preview<T> {
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> Preview<T> {
    pub fn new(mut items: Vec<T>, preview_size: usize, include_lists: bool) -> Self {
        let count = items.len();
        if !include_lists {
            items.clear();
        } else if items.len() > preview_size {
            items.truncate(preview_size);
        }
        Self { count, items }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub in_scope_never_scanned: Preview<HostRef>,
    pub open_ports_scanned_or_flagged: Preview<PortRef>,
    pub open_ports_scanned_or_flagged_by_host: Vec<HostPortGroup>,
    pub needs_ping_sweep: Preview<HostRef>,
    pub needs_top_1k_tcp: Preview<HostRef>,
    pub needs_all_tcp: Preview<HostRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneQueues {
    pub needs_ping_sweep: Vec<HostRef>,
    pub needs_top_1k_tcp: Vec<HostRef>,
    pub needs_all_tcp: Vec<HostRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExposureKey {
    pub ip_address: String,
    pub port_number: i64,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortFingerprint {
    pub service: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub extra_info: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerprintChange {
    pub ip_address: String,
    pub port_number: i64,
    pub protocol: String,
    pub before: PortFingerprint,
    pub after: PortFingerprint,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeltaReport {
    pub net_new_hosts: Preview<String>,
    pub disappeared_hosts: Preview<String>,
    pub net_new_open_exposures: Preview<ExposureKey>,
    pub disappeared_open_exposures: Preview<ExposureKey>,
    pub changed_fingerprints: Preview<FingerprintChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServicePortEntry {
    pub host_id: String,
    pub ip_address: String,
    pub port_id: String,
    pub port_number: i64,
    pub protocol: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceQueue {
    pub service: String,
    pub ports: Vec<ServicePortEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BaselineEvalReport {
    pub expected_but_never_observed: Vec<String>,
    pub observed_but_unexpected: Vec<String>,
    pub observed_and_expected: Vec<String>,
}
