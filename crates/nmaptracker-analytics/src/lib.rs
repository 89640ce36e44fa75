//! Analytics Engine (C6, spec.md §4.6): pure read-side queries over the
//! store (C4). Nothing here mutates; every function takes a pool (or an
//! open transaction via `SqliteExecutor`) and returns a snapshot.

mod baseline;
mod coverage;
mod delta;
mod gap;
mod ordering;
mod service_queues;
pub mod types;

use nmaptracker_models::error::Result;
use nmaptracker_models::scope::ScopeKind;
use sqlx::SqlitePool;

pub use baseline::{baseline_add, baseline_delete, baseline_eval, baseline_list};
pub use coverage::coverage;
pub use delta::{delta, DELTA_PREVIEW_CAP, DELTA_PREVIEW_DEFAULT};
pub use gap::{gap, milestones, GAP_PREVIEW_CAP, GAP_PREVIEW_DEFAULT};
pub use service_queues::service_queues;

/// Options shared by `gap`/`delta`: how many preview rows to return, and
/// whether to materialize preview lists at all (spec.md §4.6).
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    pub preview_size: usize,
    pub include_lists: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self { preview_size: GAP_PREVIEW_DEFAULT, include_lists: true }
    }
}

/// Thin facade bundling a pool with the C6 operation set, for callers
/// (`nmaptracker-core`) that would rather hold one handle than import
/// every free function individually.
#[derive(Clone)]
pub struct AnalyticsEngine {
    pool: SqlitePool,
}

impl AnalyticsEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn coverage(&self, project_id: &str) -> Result<types::CoverageMatrix> {
        coverage(&self.pool, project_id).await
    }

    pub async fn gap(&self, project_id: &str, opts: PreviewOptions) -> Result<types::GapReport> {
        gap(&self.pool, project_id, opts.preview_size, opts.include_lists).await
    }

    pub async fn milestones(&self, project_id: &str) -> Result<types::MilestoneQueues> {
        milestones(&self.pool, project_id).await
    }

    pub async fn delta(
        &self,
        project_id: &str,
        base_id: &str,
        target_id: &str,
        opts: PreviewOptions,
    ) -> Result<types::DeltaReport> {
        delta(&self.pool, project_id, base_id, target_id, opts.preview_size, opts.include_lists).await
    }

    pub async fn service_queues(&self, project_id: &str) -> Result<Vec<types::ServiceQueue>> {
        service_queues(&self.pool, project_id).await
    }

    pub async fn baseline_add(
        &self,
        project_id: &str,
        definition: String,
        kind: ScopeKind,
    ) -> Result<nmaptracker_models::baseline::ExpectedAssetBaseline> {
        baseline_add(&self.pool, project_id, definition, kind).await
    }

    pub async fn baseline_list(&self, project_id: &str) -> Result<Vec<nmaptracker_models::baseline::ExpectedAssetBaseline>> {
        baseline_list(&self.pool, project_id).await
    }

    pub async fn baseline_delete(&self, id: &str) -> Result<bool> {
        baseline_delete(&self.pool, id).await
    }

    pub async fn baseline_eval(&self, project_id: &str) -> Result<types::BaselineEvalReport> {
        baseline_eval(&self.pool, project_id).await
    }
}
