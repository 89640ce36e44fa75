//! Scope rule CRUD and evaluation (spec.md §6: `scope: add, delete, list,
//! evaluate`).

use nmaptracker_db::repo::scope as scope_repo;
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::scope::{ScopeDefinition, ScopeKind};
use nmaptracker_scope::ScopeMatcher;
use sqlx::SqlitePool;

pub async fn add(pool: &SqlitePool, project_id: &str, definition: String, kind: ScopeKind) -> Result<ScopeDefinition> {
    let rule = ScopeDefinition::new(project_id.to_string(), definition, kind);
    scope_repo::insert(pool, &rule).await?;
    Ok(rule)
}

pub async fn list(pool: &SqlitePool, project_id: &str) -> Result<Vec<ScopeDefinition>> {
    scope_repo::list_by_project(pool, project_id).await
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    if !scope_repo::delete(pool, id).await? {
        return Err(TrackerError::NotFound(format!("scope rule {id}")));
    }
    Ok(())
}

/// Classify `ip` against a project's compiled scope rules.
/// `allow_all_by_default` is the caller's choice of fallback (spec.md's
/// Open Question): the CLI passes `true`, programmatic callers `false`,
/// mirroring `ScopeMatcher::compile`'s own doc comment.
pub async fn evaluate(pool: &SqlitePool, project_id: &str, ip: &str, allow_all_by_default: bool) -> Result<bool> {
    let rules = scope_repo::list_by_project(pool, project_id).await?;
    let matcher = ScopeMatcher::compile(rules.into_iter().map(|r| (r.definition, r.kind_enum())), allow_all_by_default)
        .map_err(|e| TrackerError::InvalidInput(e.to_string()))?;
    matcher.in_scope(ip).map_err(|e| TrackerError::InvalidInput(e.to_string()))
}
