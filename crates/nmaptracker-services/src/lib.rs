//! Workflow Services (C7, spec.md §4.7): project/scope/host/port CRUD and
//! the operator-facing assessment-lifecycle mutations on ports.

pub mod hosts;
pub mod ports;
pub mod projects;
pub mod scope;

pub use hosts::{HostFilters, HostSort, HostSortField, HostSummary, Paging};

use nmaptracker_models::error::Result;
use nmaptracker_models::host::Host;
use nmaptracker_models::port::Port;
use nmaptracker_models::project::Project;
use nmaptracker_models::scope::{ScopeDefinition, ScopeKind};
use sqlx::SqlitePool;

/// Thin facade bundling a pool with the full C7 operation set, for callers
/// (`nmaptracker-core`) that would rather hold one handle than import
/// every free function individually.
#[derive(Clone)]
pub struct WorkflowServices {
    pool: SqlitePool,
}

impl WorkflowServices {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_project(&self, name: String) -> Result<Project> {
        projects::create(&self.pool, name).await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        projects::get_by_id(&self.pool, id).await
    }

    pub async fn get_project_by_name(&self, name: &str) -> Result<Project> {
        projects::get_by_name(&self.pool, name).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        projects::list(&self.pool).await
    }

    pub async fn rename_project(&self, id: &str, name: &str) -> Result<Project> {
        projects::update(&self.pool, id, name).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        projects::delete(&self.pool, id).await
    }

    pub async fn add_scope_rule(&self, project_id: &str, definition: String, kind: ScopeKind) -> Result<ScopeDefinition> {
        scope::add(&self.pool, project_id, definition, kind).await
    }

    pub async fn list_scope_rules(&self, project_id: &str) -> Result<Vec<ScopeDefinition>> {
        scope::list(&self.pool, project_id).await
    }

    pub async fn delete_scope_rule(&self, id: &str) -> Result<()> {
        scope::delete(&self.pool, id).await
    }

    pub async fn evaluate_scope(&self, project_id: &str, ip: &str, allow_all_by_default: bool) -> Result<bool> {
        scope::evaluate(&self.pool, project_id, ip, allow_all_by_default).await
    }

    pub async fn list_hosts_with_summary(
        &self,
        project_id: &str,
        filters: HostFilters,
        sort: HostSort,
        paging: Paging,
    ) -> Result<Vec<HostSummary>> {
        hosts::list_hosts_with_summary(&self.pool, project_id, filters, sort, paging).await
    }

    pub async fn get_host_by_id(&self, id: &str) -> Result<Host> {
        hosts::get_host_by_id(&self.pool, id).await
    }

    pub async fn list_ports(&self, host_id: &str) -> Result<Vec<Port>> {
        hosts::list_ports(&self.pool, host_id).await
    }

    pub async fn update_host_notes(&self, id: &str, notes: &str) -> Result<()> {
        hosts::update_host_notes(&self.pool, id, notes).await
    }

    pub async fn delete_host(&self, id: &str) -> Result<()> {
        hosts::delete_host(&self.pool, id).await
    }

    pub async fn update_port_status(&self, port_id: &str, status: &str) -> Result<Port> {
        ports::update_port_status(&self.pool, port_id, status).await
    }

    pub async fn update_port_notes(&self, port_id: &str, notes: &str) -> Result<()> {
        ports::update_port_notes(&self.pool, port_id, notes).await
    }

    pub async fn mark_all_open_ports_for_host(&self, host_id: &str, status: &str) -> Result<u64> {
        ports::mark_all_open_ports_for_host(&self.pool, host_id, status).await
    }

    pub async fn mark_all_open_ports_by_port_number(&self, project_id: &str, port_number: i64, status: &str) -> Result<u64> {
        ports::mark_all_open_ports_by_port_number(&self.pool, project_id, port_number, status).await
    }

    pub async fn mark_ports_by_id(&self, port_ids: &[String], status: &str) -> Result<u64> {
        ports::mark_ports_by_id(&self.pool, port_ids, status).await
    }
}
