//! Merge Engine (spec.md §4.5): the transactional, additive import
//! pipeline that turns one Nmap XML document into merged host/port rows
//! plus append-only observations, never losing operator-entered state.
//!
//! Each host get-or-creates a row, applies "if the existing field is
//! empty, take the new one" merge precedence, and upserts its ports in
//! the same pass, all inside one `sqlx` transaction per import so a
//! mid-document failure never leaves a partially merged scan behind.

mod source_meta;

use chrono::Utc;
use nmaptracker_db::repo::{host_observations, hosts, imports, port_observations, ports};
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::host::{non_empty_wins, Host, LatestScan};
use nmaptracker_models::import::{ImportStats, ScanImport};
use nmaptracker_models::intent::{IntentKind, ScanImportIntent};
use nmaptracker_models::observation::{HostObservation, PortObservation};
use nmaptracker_models::port::Port;
use nmaptracker_parsers::nmap::{self, RawHostObservation};
use nmaptracker_scope::ScopeMatcher;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::io::{BufRead, BufReader, Read};
use std::net::Ipv4Addr;

/// Everything one call to [`MergeEngine::import`] needs. Bundled into a
/// struct rather than passed positionally since several fields share a
/// type (`Option<String>`) and would be easy to transpose.
pub struct ImportRequest<R> {
    pub project_id: String,
    pub filename: String,
    pub source: R,
    pub scope: ScopeMatcher,
    pub manual_intents: Vec<IntentKind>,
    pub scanner_label: Option<String>,
    pub manual_source_ip: Option<String>,
    pub manual_source_port: Option<String>,
}

pub struct MergeEngine {
    pool: SqlitePool,
}

enum HostOutcome {
    Skipped,
    Accepted { ip_address: String, port_count: i64, in_scope: bool },
}

impl MergeEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Streaming import path (spec.md §4.5 steps 1-7). The XML document
    /// is pull-parsed on a blocking thread and each completed `<host>`
    /// crosses onto the async side over a bounded channel, so the whole
    /// import never buffers more than a handful of hosts at once
    /// regardless of document size. A host whose address is empty or not
    /// IPv4 is tallied as skipped rather than failing the import.
    pub async fn import<R>(&self, request: ImportRequest<R>) -> Result<ImportStats>
    where
        R: Read + Send + 'static,
    {
        let manual_source_ip = validate_manual_source_ip(request.manual_source_ip.as_deref())?;
        let manual_source_port = validate_manual_source_port(request.manual_source_port.as_deref())?;

        let mut tx = self.pool.begin().await?;
        let scan_import =
            ScanImport::new(request.project_id.clone(), request.filename.clone(), request.scanner_label.clone());
        imports::insert_scan_import(&mut *tx, &scan_import).await?;

        let (host_tx, mut host_rx) = tokio::sync::mpsc::channel::<RawHostObservation>(16);
        let (meta_tx, meta_rx) = tokio::sync::oneshot::channel::<nmap::RunMetadata>();

        let source = request.source;
        let parse_handle = tokio::task::spawn_blocking(move || {
            let mut meta_tx = Some(meta_tx);
            nmap::stream_hosts_with_metadata(
                BufReader::new(source),
                move |meta| {
                    if let Some(tx) = meta_tx.take() {
                        let _ = tx.send(meta.clone());
                    }
                },
                move |host| {
                    let _ = host_tx.blocking_send(host);
                },
            )
        });

        let run_metadata = meta_rx
            .await
            .map_err(|_| TrackerError::Parse("nmap XML stream closed before run metadata was read".to_string()))?;
        let nmap_args = run_metadata.nmap_args.clone();

        let (source_ip, source_port, source_port_raw) = resolve_and_record_intents_and_source(
            &mut tx,
            &scan_import.id,
            &request.filename,
            &request.manual_intents,
            nmap_args.as_deref(),
            manual_source_ip.as_deref(),
            manual_source_port.as_deref(),
        )
        .await?;

        let now = Utc::now().to_rfc3339();
        let mut in_scope_count = 0i64;
        let mut out_scope_count = 0i64;
        let mut skipped_count = 0i64;
        let mut ports_found = 0i64;
        let mut touched: Vec<String> = Vec::new();

        while let Some(raw_host) = host_rx.recv().await {
            match process_host(&mut tx, &request.project_id, &scan_import.id, &request.scope, raw_host, &now, false)
                .await?
            {
                HostOutcome::Skipped => skipped_count += 1,
                HostOutcome::Accepted { ip_address, port_count, in_scope } => {
                    if in_scope {
                        in_scope_count += 1;
                    } else {
                        out_scope_count += 1;
                    }
                    ports_found += port_count;
                    touched.push(ip_address);
                }
            }
        }

        parse_handle
            .await
            .map_err(|e| TrackerError::Internal(e.to_string()))?
            .map_err(|e| TrackerError::Parse(e.to_string()))?;

        for ip_address in &touched {
            recompute_latest_scan(&mut tx, &request.project_id, ip_address).await?;
        }

        let hosts_found = in_scope_count + out_scope_count;
        imports::update_counts(&mut *tx, &scan_import.id, hosts_found, ports_found).await?;
        tx.commit().await?;

        Ok(ImportStats {
            scan_import: ScanImport {
                hosts_found,
                ports_found,
                nmap_args,
                source_ip,
                source_port,
                source_port_raw,
                ..scan_import
            },
            in_scope: in_scope_count,
            out_scope: out_scope_count,
            skipped: skipped_count,
        })
    }

    /// List every import recorded for a project, oldest first (spec.md §6
    /// `imports: list(project)`).
    pub async fn list(&self, project_id: &str) -> Result<Vec<ScanImport>> {
        imports::list_by_project(&self.pool, project_id).await
    }

    /// Like [`MergeEngine::list`], but each import is paired with its
    /// resolved intents (spec.md §6 `imports: list_with_intents(project)`).
    pub async fn list_with_intents(&self, project_id: &str) -> Result<Vec<(ScanImport, Vec<ScanImportIntent>)>> {
        let all = imports::list_by_project(&self.pool, project_id).await?;
        let mut out = Vec::with_capacity(all.len());
        for import in all {
            let intents = imports::list_intents_by_import(&self.pool, &import.id).await?;
            out.push((import, intents));
        }
        Ok(out)
    }

    /// Fetch one import by id, scoped to `project_id` (spec.md §6
    /// `imports: get(project, id)`).
    pub async fn get(&self, project_id: &str, id: &str) -> Result<ScanImport> {
        imports::get_by_id(&self.pool, project_id, id)
            .await?
            .ok_or_else(|| TrackerError::ImportNotFound(id.to_string()))
    }

    /// Replace the stored intents for one import with a manual override
    /// (spec.md §6 `imports: set_intents(import_id, manual_intents)`),
    /// then recompute `latest_scan` for every host the import observed —
    /// the same recomputation [`MergeEngine::import`] performs inline,
    /// since a changed intent can move a host's best-observed precedence
    /// (spec.md §3 invariant 6).
    pub async fn set_intents(
        &self,
        project_id: &str,
        scan_import_id: &str,
        manual_intents: &[IntentKind],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        imports::get_by_id(&mut *tx, project_id, scan_import_id)
            .await?
            .ok_or_else(|| TrackerError::ImportNotFound(scan_import_id.to_string()))?;

        imports::delete_intents_by_import(&mut *tx, scan_import_id).await?;
        let mut seen = std::collections::HashSet::new();
        for &intent in manual_intents {
            if seen.insert(intent) {
                let row = ScanImportIntent::new(
                    scan_import_id.to_string(),
                    intent,
                    nmaptracker_models::intent::IntentSource::Manual,
                    1.0,
                );
                imports::insert_intent(&mut *tx, &row).await?;
            }
        }

        let observed = host_observations::list_by_import(&mut *tx, scan_import_id).await?;
        let mut touched = std::collections::HashSet::new();
        for obs in observed {
            if touched.insert(obs.ip_address.clone()) {
                recompute_latest_scan(&mut tx, project_id, &obs.ip_address).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Buffered convenience variant for tests and small fixtures. Unlike
    /// [`MergeEngine::import`], a non-IPv4 or empty host address fails the
    /// whole import with `InvalidInput` rather than being silently
    /// skipped — this is the one documented behavioral difference between
    /// the two paths (spec.md §4.5 step 5 / SPEC_FULL.md §9).
    pub async fn import_buffered<R: BufRead>(&self, request: ImportRequest<R>) -> Result<ImportStats> {
        let manual_source_ip = validate_manual_source_ip(request.manual_source_ip.as_deref())?;
        let manual_source_port = validate_manual_source_port(request.manual_source_port.as_deref())?;

        let (run_metadata, raw_hosts) =
            nmap::parse_all(request.source).map_err(|e| TrackerError::Parse(e.to_string()))?;
        let nmap_args = run_metadata.nmap_args;

        let mut tx = self.pool.begin().await?;
        let scan_import =
            ScanImport::new(request.project_id.clone(), request.filename.clone(), request.scanner_label.clone());
        imports::insert_scan_import(&mut *tx, &scan_import).await?;

        let (source_ip, source_port, source_port_raw) = resolve_and_record_intents_and_source(
            &mut tx,
            &scan_import.id,
            &request.filename,
            &request.manual_intents,
            nmap_args.as_deref(),
            manual_source_ip.as_deref(),
            manual_source_port.as_deref(),
        )
        .await?;

        let now = Utc::now().to_rfc3339();
        let mut in_scope_count = 0i64;
        let mut out_scope_count = 0i64;
        let mut ports_found = 0i64;
        let mut touched: Vec<String> = Vec::new();

        for raw_host in raw_hosts {
            match process_host(&mut tx, &request.project_id, &scan_import.id, &request.scope, raw_host, &now, true)
                .await?
            {
                HostOutcome::Skipped => unreachable!("hard_fail_on_non_ipv4 never returns Skipped"),
                HostOutcome::Accepted { ip_address, port_count, in_scope } => {
                    if in_scope {
                        in_scope_count += 1;
                    } else {
                        out_scope_count += 1;
                    }
                    ports_found += port_count;
                    touched.push(ip_address);
                }
            }
        }

        for ip_address in &touched {
            recompute_latest_scan(&mut tx, &request.project_id, ip_address).await?;
        }

        let hosts_found = in_scope_count + out_scope_count;
        imports::update_counts(&mut *tx, &scan_import.id, hosts_found, ports_found).await?;
        tx.commit().await?;

        Ok(ImportStats {
            scan_import: ScanImport {
                hosts_found,
                ports_found,
                nmap_args,
                source_ip,
                source_port,
                source_port_raw,
                ..scan_import
            },
            in_scope: in_scope_count,
            out_scope: out_scope_count,
            skipped: 0,
        })
    }
}

/// Resolve scan intents and source IP/port, write both back, and return
/// the resolved source triple for the caller's final `ImportStats`. Runs
/// exactly once per import, shared by the streaming and buffered paths.
async fn resolve_and_record_intents_and_source(
    tx: &mut Transaction<'_, Sqlite>,
    scan_import_id: &str,
    filename: &str,
    manual_intents: &[IntentKind],
    nmap_args: Option<&str>,
    manual_source_ip: Option<&str>,
    manual_source_port: Option<&str>,
) -> Result<(Option<String>, Option<i64>, Option<String>)> {
    let suggested = nmaptracker_parsers::intent::suggest(filename, nmap_args);
    let resolved = nmaptracker_parsers::intent::resolve(manual_intents, &suggested);
    for (kind, source, confidence) in resolved {
        let row = ScanImportIntent::new(scan_import_id.to_string(), kind, source, confidence);
        imports::insert_intent(&mut **tx, &row).await?;
    }

    let source_ip = source_meta::resolve_source_ip(nmap_args, manual_source_ip);
    let (source_port, source_port_raw) = source_meta::resolve_source_port(nmap_args, manual_source_port);
    imports::update_source_metadata(
        &mut **tx,
        scan_import_id,
        nmap_args,
        source_ip.as_deref(),
        source_port,
        source_port_raw.as_deref(),
    )
    .await?;

    Ok((source_ip, source_port, source_port_raw))
}

/// Classify, merge, and persist one parsed host plus its ports. Returns
/// [`HostOutcome::Skipped`] for an empty/non-IPv4 address unless
/// `hard_fail_on_non_ipv4` is set, in which case that case is an error.
async fn process_host(
    tx: &mut Transaction<'_, Sqlite>,
    project_id: &str,
    scan_import_id: &str,
    scope: &ScopeMatcher,
    raw: RawHostObservation,
    now: &str,
    hard_fail_on_non_ipv4: bool,
) -> Result<HostOutcome> {
    if raw.ip_address.is_empty() || raw.ip_address.parse::<Ipv4Addr>().is_err() {
        if hard_fail_on_non_ipv4 {
            return Err(TrackerError::InvalidInput(format!("host address {:?} is not IPv4", raw.ip_address)));
        }
        return Ok(HostOutcome::Skipped);
    }

    let in_scope = scope.in_scope(&raw.ip_address).map_err(|e| TrackerError::Internal(e.to_string()))?;

    let existing = hosts::get_by_project_and_ip(&mut **tx, project_id, &raw.ip_address).await?;
    let mut host = existing.unwrap_or_else(|| Host::new(project_id.to_string(), raw.ip_address.clone()));
    host.hostname = non_empty_wins(&host.hostname, &raw.hostname);
    host.os_guess = non_empty_wins(&host.os_guess, &raw.os_guess);
    host.in_scope = in_scope;
    host.updated_at = now.to_string();
    let host = hosts::upsert(&mut **tx, &host).await?;

    let host_obs = HostObservation::new(
        scan_import_id.to_string(),
        project_id.to_string(),
        raw.ip_address.clone(),
        raw.hostname.clone(),
        in_scope,
        raw.host_state.clone(),
    );
    host_observations::insert(&mut **tx, &host_obs).await?;

    let mut port_count = 0i64;
    for raw_port in raw.ports {
        let existing_port =
            ports::get_by_host_port_protocol(&mut **tx, &host.id, raw_port.port_number as i64, &raw_port.protocol)
                .await?;
        let mut port = existing_port.unwrap_or_else(|| {
            Port::new(host.id.clone(), raw_port.port_number, raw_port.protocol.clone(), raw_port.state.clone(), now)
        });
        port.state = raw_port.state.clone();
        port.service = non_empty_wins(&port.service, &raw_port.service);
        port.version = non_empty_wins(&port.version, &raw_port.version);
        port.product = non_empty_wins(&port.product, &raw_port.product);
        port.extra_info = non_empty_wins(&port.extra_info, &raw_port.extra_info);
        port.script_output = non_empty_wins(&port.script_output, &raw_port.script_output);
        port.last_seen = now.to_string();
        port.updated_at = now.to_string();
        ports::upsert(&mut **tx, &port).await?;

        let port_obs = PortObservation::new(
            scan_import_id.to_string(),
            project_id.to_string(),
            raw.ip_address.clone(),
            raw_port.port_number,
            raw_port.protocol,
            raw_port.state,
            raw_port.service,
            raw_port.version,
            raw_port.product,
            raw_port.extra_info,
            raw_port.script_output,
        );
        port_observations::insert(&mut **tx, &port_obs).await?;
        port_count += 1;
    }

    Ok(HostOutcome::Accepted { ip_address: raw.ip_address, port_count, in_scope })
}

/// Recompute `host.latest_scan` from the best intent precedence across
/// every import that has ever observed this host (spec.md §3 invariant 6,
/// §4.5 "latest-scan labeling"): `all_tcp` beats `top_1k_tcp` beats
/// `ping_sweep` beats nothing, regardless of which import is newest.
async fn recompute_latest_scan(tx: &mut Transaction<'_, Sqlite>, project_id: &str, ip_address: &str) -> Result<()> {
    let host = match hosts::get_by_project_and_ip(&mut **tx, project_id, ip_address).await? {
        Some(h) => h,
        None => return Ok(()),
    };

    let full_port = host_observations::list_import_ids_observing_ip_with_intents(
        &mut **tx,
        project_id,
        ip_address,
        &["all_tcp".to_string()],
    )
    .await?;
    let best = if !full_port.is_empty() {
        LatestScan::FullPort
    } else {
        let top_1k = host_observations::list_import_ids_observing_ip_with_intents(
            &mut **tx,
            project_id,
            ip_address,
            &["top_1k_tcp".to_string()],
        )
        .await?;
        if !top_1k.is_empty() {
            LatestScan::Top1k
        } else {
            let ping = host_observations::list_import_ids_observing_ip_with_intents(
                &mut **tx,
                project_id,
                ip_address,
                &["ping_sweep".to_string()],
            )
            .await?;
            if !ping.is_empty() {
                LatestScan::Ping
            } else {
                LatestScan::None
            }
        }
    };

    hosts::update_latest_scan(&mut **tx, &host.id, best.as_str()).await?;
    Ok(())
}

fn validate_manual_source_ip(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<Ipv4Addr>()
            .map(|ip| Some(ip.to_string()))
            .map_err(|_| TrackerError::InvalidOption(format!("manual_source_ip {s:?} is not a valid IPv4 address"))),
    }
}

fn validate_manual_source_port(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            let port: u16 = s
                .parse()
                .map_err(|_| TrackerError::InvalidOption(format!("manual_source_port {s:?} must be 1..=65535")))?;
            if port == 0 {
                return Err(TrackerError::InvalidOption(format!("manual_source_port {s:?} must be 1..=65535")));
            }
            Ok(Some(port.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmaptracker_db::pool::open_test;
    use nmaptracker_db::repo::projects;
    use nmaptracker_models::project::Project;

    const SINGLE_HOST_XML: &str = r#"<?xml version="1.0"?>
<nmaprun args="nmap -sV 10.0.0.1">
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <hostnames><hostname name="box.local" type="PTR"/></hostnames>
    <ports>
      <port protocol="tcp" portid="22">
        <state state="open"/>
        <service name="ssh" product="OpenSSH" version="7.4"/>
      </port>
    </ports>
  </host>
</nmaprun>"#;

    async fn setup_project(pool: &sqlx::SqlitePool) -> Project {
        let project = Project::new("Acme".to_string());
        projects::insert(pool, &project).await.unwrap();
        project
    }

    fn request(project_id: &str, xml: &'static str) -> ImportRequest<&'static [u8]> {
        ImportRequest {
            project_id: project_id.to_string(),
            filename: "scan.xml".to_string(),
            source: xml.as_bytes(),
            scope: ScopeMatcher::compile(std::iter::empty(), true).unwrap(),
            manual_intents: Vec::new(),
            scanner_label: Some("nmap".to_string()),
            manual_source_ip: None,
            manual_source_port: None,
        }
    }

    #[tokio::test]
    async fn test_single_host_import_creates_host_and_port() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let stats = engine.import(request(&project.id, SINGLE_HOST_XML)).await.unwrap();
        assert_eq!(stats.in_scope, 1);
        assert_eq!(stats.out_scope, 0);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.scan_import.hosts_found, 1);
        assert_eq!(stats.scan_import.ports_found, 1);

        let host = hosts::get_by_project_and_ip(&pool, &project.id, "10.0.0.1").await.unwrap().unwrap();
        assert!(host.in_scope);
        assert_eq!(host.hostname.as_deref(), Some("box.local"));
        assert_eq!(host.latest_scan, "top-1k");

        let port = ports::get_by_host_port_protocol(&pool, &host.id, 22, "tcp").await.unwrap().unwrap();
        assert_eq!(port.work_status, "scanned");
        assert_eq!(port.product.as_deref(), Some("OpenSSH"));
    }

    #[tokio::test]
    async fn test_reimport_preserves_flagged_status_and_merges_fingerprint() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        engine.import(request(&project.id, SINGLE_HOST_XML)).await.unwrap();
        let host = hosts::get_by_project_and_ip(&pool, &project.id, "10.0.0.1").await.unwrap().unwrap();
        let port = ports::get_by_host_port_protocol(&pool, &host.id, 22, "tcp").await.unwrap().unwrap();
        ports::update_work_status(&pool, &port.id, "flagged", "2026-01-02T00:00:00Z").await.unwrap();

        const SECOND_XML: &str = r#"<?xml version="1.0"?>
<nmaprun args="nmap -sV 10.0.0.1">
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="22">
        <state state="open"/>
        <service name="ssh" product="OpenSSH" version="8.2"/>
      </port>
    </ports>
  </host>
</nmaprun>"#;
        engine.import(request(&project.id, SECOND_XML)).await.unwrap();

        let port = ports::get_by_host_port_protocol(&pool, &host.id, 22, "tcp").await.unwrap().unwrap();
        assert_eq!(port.work_status, "flagged", "reimport must not downgrade work_status");
        assert_eq!(port.version.as_deref(), Some("8.2"));
        assert_eq!(port.product.as_deref(), Some("OpenSSH"), "non-empty-wins keeps prior value when new is absent");

        let observations = host_observations::list_by_project(&pool, &project.id).await.unwrap();
        assert_eq!(observations.len(), 2, "both imports must leave an observation behind");
    }

    #[tokio::test]
    async fn test_out_of_scope_host_is_counted_but_flagged() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let mut req = request(&project.id, SINGLE_HOST_XML);
        req.scope = ScopeMatcher::compile(
            vec![("10.0.1.0/24".to_string(), nmaptracker_models::scope::ScopeKind::Include)],
            false,
        )
        .unwrap();

        let stats = engine.import(req).await.unwrap();
        assert_eq!(stats.in_scope, 0);
        assert_eq!(stats.out_scope, 1);

        let host = hosts::get_by_project_and_ip(&pool, &project.id, "10.0.0.1").await.unwrap().unwrap();
        assert!(!host.in_scope);
    }

    #[tokio::test]
    async fn test_manual_source_ip_rejected_when_not_ipv4() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let mut req = request(&project.id, SINGLE_HOST_XML);
        req.manual_source_ip = Some("not-an-ip".to_string());
        let err = engine.import(req).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidOption(_)));
    }

    #[tokio::test]
    async fn test_manual_source_port_out_of_range_rejected() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let mut req = request(&project.id, SINGLE_HOST_XML);
        req.manual_source_port = Some("99999".to_string());
        let err = engine.import(req).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidOption(_)));
    }

    #[tokio::test]
    async fn test_manual_intent_recorded_alongside_auto_suggestion() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let mut req = request(&project.id, SINGLE_HOST_XML);
        req.manual_intents = vec![IntentKind::VulnNse];
        let stats = engine.import(req).await.unwrap();

        let rows = imports::list_intents_by_import(&pool, &stats.scan_import.id).await.unwrap();
        assert!(rows.iter().any(|r| r.intent == "vuln_nse" && r.source == "manual"));
        assert!(rows.iter().any(|r| r.intent == "top_1k_tcp" && r.source == "auto"));
    }

    #[tokio::test]
    async fn test_buffered_import_hard_fails_on_non_ipv4_host() {
        const IPV6_XML: &str = r#"<?xml version="1.0"?>
<nmaprun>
  <host><status state="up"/><address addr="fe80::1" addrtype="ipv6"/></host>
</nmaprun>"#;
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let req = request(&project.id, IPV6_XML);
        let err = engine.import_buffered(req).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));

        assert!(imports::list_by_project(&pool, &project.id).await.unwrap().is_empty(), "rollback must be atomic");
    }

    #[tokio::test]
    async fn test_streaming_import_skips_non_ipv4_host_instead_of_failing() {
        const MIXED_XML: &str = r#"<?xml version="1.0"?>
<nmaprun>
  <host><status state="up"/><address addr="fe80::1" addrtype="ipv6"/></host>
  <host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
</nmaprun>"#;
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let stats = engine.import(request(&project.id, MIXED_XML)).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.in_scope, 1);
    }

    #[tokio::test]
    async fn test_source_ip_and_port_resolved_from_manual_when_argv_silent() {
        const NO_ARGS_XML: &str = r#"<?xml version="1.0"?>
<nmaprun>
  <host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
</nmaprun>"#;
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let mut req = request(&project.id, NO_ARGS_XML);
        req.manual_source_ip = Some("10.0.0.9".to_string());
        req.manual_source_port = Some("4444".to_string());
        let stats = engine.import(req).await.unwrap();

        assert_eq!(stats.scan_import.source_ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(stats.scan_import.source_port, Some(4444));
    }

    #[tokio::test]
    async fn test_list_get_and_list_with_intents() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let stats = engine.import(request(&project.id, SINGLE_HOST_XML)).await.unwrap();

        let listed = engine.list(&project.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, stats.scan_import.id);

        let fetched = engine.get(&project.id, &stats.scan_import.id).await.unwrap();
        assert_eq!(fetched.id, stats.scan_import.id);

        let with_intents = engine.list_with_intents(&project.id).await.unwrap();
        assert_eq!(with_intents.len(), 1);
        assert!(with_intents[0].1.iter().any(|i| i.intent == "top_1k_tcp"));
    }

    #[tokio::test]
    async fn test_get_unknown_import_is_import_not_found() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let err = engine.get(&project.id, "does-not-exist").await.unwrap_err();
        assert!(matches!(err, TrackerError::ImportNotFound(_)));
    }

    #[tokio::test]
    async fn test_set_intents_overrides_and_recomputes_latest_scan() {
        let pool = open_test().await.unwrap();
        let project = setup_project(&pool).await;
        let engine = MergeEngine::new(pool.clone());

        let stats = engine.import(request(&project.id, SINGLE_HOST_XML)).await.unwrap();
        let host = hosts::get_by_project_and_ip(&pool, &project.id, "10.0.0.1").await.unwrap().unwrap();
        assert_eq!(host.latest_scan, "top-1k");

        engine.set_intents(&project.id, &stats.scan_import.id, &[IntentKind::AllTcp]).await.unwrap();

        let rows = imports::list_intents_by_import(&pool, &stats.scan_import.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].intent, "all_tcp");
        assert_eq!(rows[0].source, "manual");

        let host = hosts::get_by_project_and_ip(&pool, &project.id, "10.0.0.1").await.unwrap().unwrap();
        assert_eq!(host.latest_scan, "full-port", "set_intents must recompute latest_scan");
    }
}
