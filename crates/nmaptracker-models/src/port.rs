//! Port model types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operator-facing assessment-lifecycle tag on an open port (spec.md §4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Scanned,
    Flagged,
    InProgress,
    Done,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Flagged => "flagged",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parse a raw work-status string. Returns `None` for anything outside
    /// the closed set (including the legacy `parking_lot`, which migration
    /// normalizes to `flagged` rather than this parser accepting it).
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scanned" => Some(Self::Scanned),
            "flagged" => Some(Self::Flagged),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// A port observed on a host, merged across all its imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Port {
    pub id: String,
    pub host_id: String,
    pub port_number: i64,
    pub protocol: String,
    pub state: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub product: Option<String>,
    pub extra_info: Option<String>,
    pub work_status: String,
    pub script_output: Option<String>,
    pub notes: String,
    pub last_seen: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Port {
    pub fn new(host_id: String, port_number: u16, protocol: String, state: String, now: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            host_id,
            port_number: port_number as i64,
            protocol,
            state,
            service: None,
            version: None,
            product: None,
            extra_info: None,
            work_status: WorkStatus::Scanned.as_str().to_string(),
            script_output: None,
            notes: String::new(),
            last_seen: now.to_string(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn work_status_enum(&self) -> Option<WorkStatus> {
        WorkStatus::from_str(&self.work_status)
    }

    pub fn is_open(&self) -> bool {
        self.state == "open"
    }

    pub fn is_exposure(&self) -> bool {
        self.state == "open" || self.state == "open|filtered"
    }
}

/// Choose `new` if it is non-empty after trimming, otherwise keep `existing`
/// (spec.md §4.5's "non-empty-wins" merge rule for fingerprint fields).
pub fn non_empty_wins(existing: &Option<String>, new: &Option<String>) -> Option<String> {
    match new {
        Some(v) if !v.trim().is_empty() => Some(v.clone()),
        _ => existing.clone(),
    }
}
