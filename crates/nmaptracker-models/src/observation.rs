//! Per-import observation model types. Observations are append-only: they
//! are written once by the Merge Engine and never updated, only cascaded
//! away with their parent import (spec.md §3).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a single import saw for one host, independent of the merged
/// current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct HostObservation {
    pub id: String,
    pub scan_import_id: String,
    pub project_id: String,
    pub ip_address: String,
    pub hostname: Option<String>,
    pub in_scope: bool,
    pub host_state: String,
}

impl HostObservation {
    pub fn new(
        scan_import_id: String,
        project_id: String,
        ip_address: String,
        hostname: Option<String>,
        in_scope: bool,
        host_state: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scan_import_id,
            project_id,
            ip_address,
            hostname,
            in_scope,
            host_state,
        }
    }
}

/// What a single import saw for one port on one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PortObservation {
    pub id: String,
    pub scan_import_id: String,
    pub project_id: String,
    pub ip_address: String,
    pub port_number: i64,
    pub protocol: String,
    pub state: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub product: Option<String>,
    pub extra_info: Option<String>,
    pub script_output: Option<String>,
}

impl PortObservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scan_import_id: String,
        project_id: String,
        ip_address: String,
        port_number: u16,
        protocol: String,
        state: String,
        service: Option<String>,
        version: Option<String>,
        product: Option<String>,
        extra_info: Option<String>,
        script_output: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scan_import_id,
            project_id,
            ip_address,
            port_number: port_number as i64,
            protocol,
            state,
            service,
            version,
            product,
            extra_info,
            script_output,
        }
    }

    pub fn is_exposure(&self) -> bool {
        self.state == "open" || self.state == "open|filtered"
    }
}
