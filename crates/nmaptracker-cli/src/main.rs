//! CLI entry point: thin dispatch from parsed args onto `nmaptracker_core::Tracker`.
//! No business logic lives here.

mod args;

use std::fs::File;
use std::io::BufReader;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use args::{BaselineCommand, Cli, Command, ProjectCommand, ScopeCommand};
use nmaptracker_core::config::load_config;
use nmaptracker_core::models::intent::IntentKind;
use nmaptracker_core::models::scope::ScopeKind;
use nmaptracker_core::Tracker;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config_dir.as_deref()).context("loading configuration")?;
    if let Some(database) = &cli.database {
        config.database.path = database.to_string_lossy().into_owned();
    }

    let tracker = Tracker::open(config).await.context("opening tracker store")?;

    match cli.command {
        Command::Project { command } => run_project(&tracker, command).await,
        Command::Scope { command } => run_scope(&tracker, command).await,
        Command::Import(args) => run_import(&tracker, args).await,
        Command::Imports { project_id } => {
            let imports = tracker.list_imports_with_intents(&project_id).await?;
            print_json(&imports)
        }
        Command::Hosts(args) => run_hosts(&tracker, args).await,
        Command::Coverage { project_id } => {
            let report = tracker.coverage(&project_id).await?;
            print_json(&report)
        }
        Command::Gap(args) => {
            let preview_size = args.preview.preview_size;
            let include_lists = !args.preview.no_lists;
            let report = tracker.gap(&args.project_id, preview_size, include_lists).await?;
            print_json(&report)
        }
        Command::Queues { project_id } => {
            let report = tracker.milestones(&project_id).await?;
            print_json(&report)
        }
        Command::Delta { project_id, base_id, target_id, preview } => {
            let report = tracker
                .delta(&project_id, &base_id, &target_id, preview.preview_size, !preview.no_lists)
                .await?;
            print_json(&report)
        }
        Command::ServiceQueues { project_id } => {
            let queues = tracker.service_queues(&project_id).await?;
            print_json(&queues)
        }
        Command::Baseline { command } => run_baseline(&tracker, command).await,
    }
}

async fn run_project(tracker: &Tracker, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::Create { name } => {
            let project = tracker.create_project(name).await?;
            print_json(&project)
        }
        ProjectCommand::List => {
            let projects = tracker.list_projects().await?;
            print_json(&projects)
        }
        ProjectCommand::Delete { id } => {
            tracker.delete_project(&id).await?;
            println!("deleted project {id}");
            Ok(())
        }
    }
}

async fn run_scope(tracker: &Tracker, command: ScopeCommand) -> Result<()> {
    match command {
        ScopeCommand::Add { project_id, definition, kind } => {
            let kind = ScopeKind::from_str_lossy(&kind);
            let rule = tracker.add_scope_rule(&project_id, definition, kind).await?;
            print_json(&rule)
        }
        ScopeCommand::List { project_id } => {
            let rules = tracker.list_scope_rules(&project_id).await?;
            print_json(&rules)
        }
        ScopeCommand::Delete { id } => {
            tracker.delete_scope_rule(&id).await?;
            println!("deleted scope rule {id}");
            Ok(())
        }
    }
}

async fn run_baseline(tracker: &Tracker, command: BaselineCommand) -> Result<()> {
    match command {
        BaselineCommand::Add { project_id, definition, kind } => {
            let kind = ScopeKind::from_str_lossy(&kind);
            let baseline = tracker.baseline_add(&project_id, definition, kind).await?;
            print_json(&baseline)
        }
        BaselineCommand::List { project_id } => {
            let baselines = tracker.baseline_list(&project_id).await?;
            print_json(&baselines)
        }
        BaselineCommand::Delete { id } => {
            let existed = tracker.baseline_delete(&id).await?;
            if !existed {
                bail!("baseline definition {id} not found");
            }
            println!("deleted baseline definition {id}");
            Ok(())
        }
        BaselineCommand::Eval { project_id } => {
            let report = tracker.baseline_eval(&project_id).await?;
            print_json(&report)
        }
    }
}

async fn run_import(tracker: &Tracker, args: args::ImportArgs) -> Result<()> {
    let mut intents = Vec::with_capacity(args.intents.len());
    for raw in &args.intents {
        let intent = IntentKind::from_str(raw).with_context(|| format!("unknown intent kind {raw:?}"))?;
        intents.push(intent);
    }

    let filename = args.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| args.path.to_string_lossy().into_owned());
    let file = File::open(&args.path).with_context(|| format!("opening {}", args.path.display()))?;
    let reader = BufReader::new(file);

    let stats = tracker
        .import(&args.project_id, filename, reader, intents, args.scanner_label, args.source_ip, args.source_port)
        .await?;
    print_json(&stats)
}

async fn run_hosts(tracker: &Tracker, args: args::HostsArgs) -> Result<()> {
    use nmaptracker_core::services::{HostFilters, HostSort, Paging};

    let filters = HostFilters { in_scope: args.in_scope, latest_scan: args.latest_scan, search: args.search };
    let sort = HostSort::default();
    let paging = Paging { offset: args.offset, limit: args.limit };

    let summaries = tracker.list_hosts_with_summary(&args.project_id, filters, sort, paging).await?;
    print_json(&summaries.into_iter().map(HostSummaryJson::from).collect::<Vec<_>>())
}

/// `HostSummary` is not `Serialize` (it bundles `Host`, which already is,
/// with plain counts); flatten into a JSON-friendly shape here rather than
/// adding a serde dependency the analytics DTOs don't need.
#[derive(serde::Serialize)]
struct HostSummaryJson {
    host: nmaptracker_core::models::host::Host,
    open_port_count: i64,
    total_port_count: i64,
}

impl From<nmaptracker_core::services::HostSummary> for HostSummaryJson {
    fn from(s: nmaptracker_core::services::HostSummary) -> Self {
        Self { host: s.host, open_port_count: s.open_port_count, total_port_count: s.total_port_count }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
