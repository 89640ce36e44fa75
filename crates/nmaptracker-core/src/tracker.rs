//! `Tracker`: the single facade wiring the Store (C4), Merge Engine (C5),
//! Workflow Services (C7) and Analytics Engine (C6) together behind one
//! struct holding the pool plus every subsystem a caller needs, opened
//! once at startup.

use std::io::Read;
use std::path::Path;

use nmaptracker_analytics::{AnalyticsEngine, PreviewOptions};
use nmaptracker_db::pool::open;
use nmaptracker_merge::{ImportRequest, MergeEngine};
use nmaptracker_models::baseline::ExpectedAssetBaseline;
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::host::Host;
use nmaptracker_models::import::{ImportStats, ScanImport};
use nmaptracker_models::intent::IntentKind;
use nmaptracker_models::port::Port;
use nmaptracker_models::project::Project;
use nmaptracker_models::scope::{ScopeDefinition, ScopeKind};
use nmaptracker_scope::ScopeMatcher;
use nmaptracker_services::{HostFilters, HostSort, HostSummary, Paging, WorkflowServices};
use sqlx::SqlitePool;

use crate::config::TrackerConfig;

/// The facade `nmaptracker-cli` (and any other frontend) talks to. Holds
/// one `SqlitePool` and one instance of each sub-engine; all of them are
/// cheap to clone since they only wrap the pool.
#[derive(Clone)]
pub struct Tracker {
    pool: SqlitePool,
    config: TrackerConfig,
    services: WorkflowServices,
    merge: MergeEngine,
    analytics: AnalyticsEngine,
}

impl Tracker {
    /// Open (and migrate) the database named by `config.database.path` and
    /// wire up every sub-engine against it.
    pub async fn open(config: TrackerConfig) -> Result<Self> {
        let url = format!("sqlite:{}", config.database.path);
        let pool = open(&url).await.map_err(TrackerError::from)?;
        Ok(Self::from_pool(pool, config))
    }

    /// Open an already-initialized pool (primarily for tests), e.g. one
    /// built with `nmaptracker_db::pool::open_test`.
    pub fn from_pool(pool: SqlitePool, config: TrackerConfig) -> Self {
        let services = WorkflowServices::new(pool.clone());
        let merge = MergeEngine::new(pool.clone());
        let analytics = AnalyticsEngine::new(pool.clone());
        Self { pool, config, services, merge, analytics }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ---- projects (spec.md §6 "projects:") ----------------------------

    pub async fn create_project(&self, name: String) -> Result<Project> {
        self.services.create_project(name).await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        self.services.get_project(id).await
    }

    pub async fn get_project_by_name(&self, name: &str) -> Result<Project> {
        self.services.get_project_by_name(name).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.services.list_projects().await
    }

    pub async fn rename_project(&self, id: &str, name: &str) -> Result<Project> {
        self.services.rename_project(id, name).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        self.services.delete_project(id).await
    }

    // ---- scope (spec.md §6 "scope:") -----------------------------------

    pub async fn add_scope_rule(&self, project_id: &str, definition: String, kind: ScopeKind) -> Result<ScopeDefinition> {
        self.services.add_scope_rule(project_id, definition, kind).await
    }

    pub async fn list_scope_rules(&self, project_id: &str) -> Result<Vec<ScopeDefinition>> {
        self.services.list_scope_rules(project_id).await
    }

    pub async fn delete_scope_rule(&self, id: &str) -> Result<()> {
        self.services.delete_scope_rule(id).await
    }

    pub async fn evaluate_scope(&self, project_id: &str, ip: &str) -> Result<bool> {
        self.services.evaluate_scope(project_id, ip, self.config.scope.allow_all_by_default).await
    }

    /// Compile the project's current rule set into a [`ScopeMatcher`], the
    /// form `imports` needs (spec.md §4.5 step 1).
    pub async fn compile_scope(&self, project_id: &str) -> Result<ScopeMatcher> {
        let rules = self.services.list_scope_rules(project_id).await?;
        ScopeMatcher::compile(
            rules.into_iter().map(|r| (r.definition, r.kind_enum())),
            self.config.scope.allow_all_by_default,
        )
        .map_err(|e| TrackerError::InvalidInput(e.to_string()))
    }

    // ---- imports (spec.md §6 "imports:") -------------------------------

    /// Import an nmap XML document, streaming it off `source` (spec.md
    /// §4.5). The scope rules are compiled fresh from the project's
    /// current definitions; manual intents/source overrides are passed
    /// straight through to the merge engine.
    #[allow(clippy::too_many_arguments)]
    pub async fn import<R>(
        &self,
        project_id: &str,
        filename: String,
        source: R,
        manual_intents: Vec<IntentKind>,
        scanner_label: Option<String>,
        manual_source_ip: Option<String>,
        manual_source_port: Option<String>,
    ) -> Result<ImportStats>
    where
        R: Read + Send + 'static,
    {
        let scope = self.compile_scope(project_id).await?;
        let request = ImportRequest {
            project_id: project_id.to_string(),
            filename,
            source,
            scope,
            manual_intents,
            scanner_label,
            manual_source_ip,
            manual_source_port,
        };
        self.merge.import(request).await
    }

    pub async fn list_imports(&self, project_id: &str) -> Result<Vec<ScanImport>> {
        self.merge.list(project_id).await
    }

    pub async fn list_imports_with_intents(
        &self,
        project_id: &str,
    ) -> Result<Vec<(ScanImport, Vec<nmaptracker_models::intent::ScanImportIntent>)>> {
        self.merge.list_with_intents(project_id).await
    }

    pub async fn get_import(&self, project_id: &str, id: &str) -> Result<ScanImport> {
        self.merge.get(project_id, id).await
    }

    pub async fn set_import_intents(&self, project_id: &str, scan_import_id: &str, manual_intents: &[IntentKind]) -> Result<()> {
        self.merge.set_intents(project_id, scan_import_id, manual_intents).await
    }

    // ---- hosts / ports (spec.md §6 "hosts:"/"ports:") ------------------

    pub async fn list_hosts_with_summary(
        &self,
        project_id: &str,
        filters: HostFilters,
        sort: HostSort,
        paging: Paging,
    ) -> Result<Vec<HostSummary>> {
        self.services.list_hosts_with_summary(project_id, filters, sort, paging).await
    }

    pub async fn get_host_by_id(&self, id: &str) -> Result<Host> {
        self.services.get_host_by_id(id).await
    }

    pub async fn list_ports(&self, host_id: &str) -> Result<Vec<Port>> {
        self.services.list_ports(host_id).await
    }

    pub async fn update_host_notes(&self, id: &str, notes: &str) -> Result<()> {
        self.services.update_host_notes(id, notes).await
    }

    pub async fn delete_host(&self, id: &str) -> Result<()> {
        self.services.delete_host(id).await
    }

    pub async fn update_port_status(&self, port_id: &str, status: &str) -> Result<Port> {
        self.services.update_port_status(port_id, status).await
    }

    pub async fn update_port_notes(&self, port_id: &str, notes: &str) -> Result<()> {
        self.services.update_port_notes(port_id, notes).await
    }

    pub async fn mark_all_open_ports_for_host(&self, host_id: &str, status: &str) -> Result<u64> {
        self.services.mark_all_open_ports_for_host(host_id, status).await
    }

    pub async fn mark_all_open_ports_by_port_number(&self, project_id: &str, port_number: i64, status: &str) -> Result<u64> {
        self.services.mark_all_open_ports_by_port_number(project_id, port_number, status).await
    }

    pub async fn mark_ports_by_id(&self, port_ids: &[String], status: &str) -> Result<u64> {
        self.services.mark_ports_by_id(port_ids, status).await
    }

    // ---- analytics (spec.md §6 "analytics:") ---------------------------

    pub async fn coverage(&self, project_id: &str) -> Result<nmaptracker_analytics::types::CoverageMatrix> {
        self.analytics.coverage(project_id).await
    }

    pub async fn gap(&self, project_id: &str, preview_size: Option<usize>, include_lists: bool) -> Result<nmaptracker_analytics::types::GapReport> {
        let opts = PreviewOptions {
            preview_size: preview_size.unwrap_or(self.config.analytics.default_preview_size),
            include_lists,
        };
        self.analytics.gap(project_id, opts).await
    }

    pub async fn milestones(&self, project_id: &str) -> Result<nmaptracker_analytics::types::MilestoneQueues> {
        self.analytics.milestones(project_id).await
    }

    pub async fn delta(
        &self,
        project_id: &str,
        base_id: &str,
        target_id: &str,
        preview_size: Option<usize>,
        include_lists: bool,
    ) -> Result<nmaptracker_analytics::types::DeltaReport> {
        let opts = PreviewOptions {
            preview_size: preview_size.unwrap_or(self.config.analytics.default_preview_size),
            include_lists,
        };
        self.analytics.delta(project_id, base_id, target_id, opts).await
    }

    pub async fn service_queues(&self, project_id: &str) -> Result<Vec<nmaptracker_analytics::types::ServiceQueue>> {
        self.analytics.service_queues(project_id).await
    }

    pub async fn baseline_add(&self, project_id: &str, definition: String, kind: ScopeKind) -> Result<ExpectedAssetBaseline> {
        self.analytics.baseline_add(project_id, definition, kind).await
    }

    pub async fn baseline_list(&self, project_id: &str) -> Result<Vec<ExpectedAssetBaseline>> {
        self.analytics.baseline_list(project_id).await
    }

    pub async fn baseline_delete(&self, id: &str) -> Result<bool> {
        self.analytics.baseline_delete(id).await
    }

    pub async fn baseline_eval(&self, project_id: &str) -> Result<nmaptracker_analytics::types::BaselineEvalReport> {
        self.analytics.baseline_eval(project_id).await
    }
}

/// Convenience used by tests and the CLI's `--database` override: open a
/// pool at an explicit path rather than the one baked into `config`.
pub async fn open_at(path: &Path, config: TrackerConfig) -> Result<Tracker> {
    let url = format!("sqlite:{}", path.display());
    let pool = open(&url).await.map_err(TrackerError::from)?;
    Ok(Tracker::from_pool(pool, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmaptracker_db::pool::open_test;

    fn test_config() -> TrackerConfig {
        TrackerConfig::default()
    }

    #[tokio::test]
    async fn test_tracker_wires_project_and_scope_together() {
        let pool = open_test().await.unwrap();
        let tracker = Tracker::from_pool(pool, test_config());

        let project = tracker.create_project("Acme".to_string()).await.unwrap();
        tracker.add_scope_rule(&project.id, "10.0.0.0/24".to_string(), ScopeKind::Include).await.unwrap();

        assert!(tracker.evaluate_scope(&project.id, "10.0.0.5").await.unwrap());
        assert!(!tracker.evaluate_scope(&project.id, "192.168.1.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_tracker_compiles_scope_with_configured_default() {
        let pool = open_test().await.unwrap();
        let mut config = test_config();
        config.scope.allow_all_by_default = false;
        let tracker = Tracker::from_pool(pool, config);

        let project = tracker.create_project("Acme".to_string()).await.unwrap();
        let matcher = tracker.compile_scope(&project.id).await.unwrap();
        assert!(!matcher.in_scope("8.8.8.8").unwrap());
    }

    #[tokio::test]
    async fn test_tracker_import_then_list_roundtrip() {
        let pool = open_test().await.unwrap();
        let tracker = Tracker::from_pool(pool, test_config());
        let project = tracker.create_project("Acme".to_string()).await.unwrap();

        let xml = br#"<?xml version="1.0"?>
<nmaprun args="nmap -sS 10.0.0.1">
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <ports><port protocol="tcp" portid="22"><state state="open"/></port></ports>
  </host>
</nmaprun>"#;

        let stats = tracker
            .import(&project.id, "scan.xml".to_string(), &xml[..], vec![], None, None, None)
            .await
            .unwrap();
        assert_eq!(stats.in_scope, 1);

        let imports = tracker.list_imports(&project.id).await.unwrap();
        assert_eq!(imports.len(), 1);

        let hosts = tracker
            .list_hosts_with_summary(&project.id, HostFilters::default(), HostSort::default(), Paging::default())
            .await
            .unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].host.ip_address, "10.0.0.1");
    }
}
