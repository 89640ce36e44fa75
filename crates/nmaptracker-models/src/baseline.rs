//! Expected asset baseline model types (IPv4-only, spec.md §3).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::ScopeKind;

/// An operator-defined rule describing the IPv4 assets expected to exist
/// in scope. Reuses `ScopeKind` for include/exclude semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpectedAssetBaseline {
    pub id: String,
    pub project_id: String,
    pub definition: String,
    pub kind: String,
    pub created_at: String,
}

impl ExpectedAssetBaseline {
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
