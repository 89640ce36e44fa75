//! Project model types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A top-level tenant. Deleting a project cascades to all its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn new(name: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
