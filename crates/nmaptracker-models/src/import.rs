//! Scan import model types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One successful ingest of an Nmap XML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScanImport {
    pub id: String,
    pub project_id: String,
    pub filename: String,
    pub import_time: String,
    pub hosts_found: i64,
    pub ports_found: i64,
    pub nmap_args: Option<String>,
    pub scanner_label: Option<String>,
    pub source_ip: Option<String>,
    pub source_port: Option<i64>,
    pub source_port_raw: Option<String>,
}

impl ScanImport {
    pub fn new(project_id: String, filename: String, scanner_label: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            filename,
            import_time: Utc::now().to_rfc3339(),
            hosts_found: 0,
            ports_found: 0,
            nmap_args: None,
            scanner_label,
            source_ip: None,
            source_port: None,
            source_port_raw: None,
        }
    }
}

/// Outcome of one `MergeEngine::import` call (spec.md §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    pub scan_import: ScanImport,
    pub in_scope: i64,
    pub out_scope: i64,
    pub skipped: i64,
}
