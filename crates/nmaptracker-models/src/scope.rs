//! Scope definition model types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a scope rule admits or excludes matching IPs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Include,
    Exclude,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "exclude" => Self::Exclude,
            _ => Self::Include,
        }
    }
}

/// A single scope rule attached to a project. `definition` may be a CIDR,
/// a dotted IP, or an `A-B` range, interpreted by `nmaptracker-scope`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScopeDefinition {
    pub id: String,
    pub project_id: String,
    pub definition: String,
    pub kind: String,
    pub created_at: String,
}

impl ScopeDefinition {
    pub fn new(project_id: String, definition: String, kind: ScopeKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            definition,
            kind: kind.as_str().to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn kind_enum(&self) -> ScopeKind {
        ScopeKind::from_str_lossy(&self.kind)
    }
}
