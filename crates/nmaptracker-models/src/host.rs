//! Host model types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use uuid::Uuid;

/// Best intent observed for a host, used to label "how thoroughly scanned".
/// Precedence: `FullPort` > `Top1k` > `Ping` > `None` (spec.md §3 invariant 6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum LatestScan {
    None,
    Ping,
    Top1k,
    FullPort,
}

impl LatestScan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ping => "ping",
            Self::Top1k => "top-1k",
            Self::FullPort => "full-port",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "ping" => Self::Ping,
            "top-1k" => Self::Top1k,
            "full-port" => Self::FullPort,
            _ => Self::None,
        }
    }
}

/// A host discovered within a project, merged across all its imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Host {
    pub id: String,
    pub project_id: String,
    pub ip_address: String,
    pub ip_int: Option<i64>,
    pub hostname: Option<String>,
    pub os_guess: Option<String>,
    pub in_scope: bool,
    pub latest_scan: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Host {
    pub fn new(project_id: String, ip_address: String) -> Self {
        let now = Utc::now().to_rfc3339();
        let ip_int = ipv4_to_int(&ip_address);
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            ip_address,
            ip_int,
            hostname: None,
            os_guess: None,
            in_scope: false,
            latest_scan: LatestScan::None.as_str().to_string(),
            notes: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn latest_scan_enum(&self) -> LatestScan {
        LatestScan::from_str_lossy(&self.latest_scan)
    }
}

/// Compute the big-endian 32-bit integer form of an IPv4 dotted address.
/// Returns `None` for anything that does not parse as IPv4 (spec.md §3
/// invariant 4 — `ip_int` is present only for IPv4 hosts).
pub fn ipv4_to_int(ip_address: &str) -> Option<i64> {
    ip_address.parse::<Ipv4Addr>().ok().map(|addr| u32::from(addr) as i64)
}
