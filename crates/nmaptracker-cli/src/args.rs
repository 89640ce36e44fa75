//! Command-line surface for the tracker (spec.md §4.10). A thin,
//! subcommand-per-noun layout: `project`, `scope`, and `baseline` each
//! wrap their own subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nmaptracker", version, about = "Local-first nmap scan tracker for pentest engagements")]
pub struct Cli {
    /// Directory holding default.toml / local.toml (defaults to "config").
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Override the database path from config.
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project CRUD.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Scope rule CRUD.
    Scope {
        #[command(subcommand)]
        command: ScopeCommand,
    },
    /// Import an nmap XML scan into a project.
    Import(ImportArgs),
    /// List imports for a project.
    Imports {
        /// Project id.
        project_id: String,
    },
    /// List hosts for a project.
    Hosts(HostsArgs),
    /// Print the per-host intent coverage matrix.
    Coverage {
        /// Project id.
        project_id: String,
    },
    /// Print the assessment gap report.
    Gap(PreviewArgs),
    /// Print the sorted milestone queues (no preview truncation).
    Queues {
        /// Project id.
        project_id: String,
    },
    /// Print the delta report between two imports.
    Delta {
        /// Project id.
        project_id: String,
        /// Baseline import id.
        base_id: String,
        /// Target import id.
        target_id: String,
        #[command(flatten)]
        preview: PreviewOptionsArgs,
    },
    /// Print service-grouped open-port queues.
    ServiceQueues {
        /// Project id.
        project_id: String,
    },
    /// Expected-asset baseline management.
    Baseline {
        #[command(subcommand)]
        command: BaselineCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a new project.
    Create {
        /// Project name.
        name: String,
    },
    /// List all projects.
    List,
    /// Delete a project (cascades to its scope/imports/hosts/ports).
    Delete {
        /// Project id.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScopeCommand {
    /// Add a scope rule (CIDR, `A-B` range, or single IP).
    Add {
        /// Project id.
        project_id: String,
        /// CIDR, range, or single IP.
        definition: String,
        /// "include" or "exclude".
        #[arg(long, default_value = "include")]
        kind: String,
    },
    /// List scope rules for a project.
    List {
        /// Project id.
        project_id: String,
    },
    /// Delete a scope rule.
    Delete {
        /// Scope rule id.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BaselineCommand {
    /// Add an expected-asset baseline definition.
    Add {
        /// Project id.
        project_id: String,
        /// CIDR, range, or single IP.
        definition: String,
        /// "include" or "exclude".
        #[arg(long, default_value = "include")]
        kind: String,
    },
    /// List baseline definitions for a project.
    List {
        /// Project id.
        project_id: String,
    },
    /// Delete a baseline definition.
    Delete {
        /// Baseline definition id.
        id: String,
    },
    /// Evaluate observed hosts against the baseline.
    Eval {
        /// Project id.
        project_id: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Project id.
    pub project_id: String,
    /// Path to the nmap XML file.
    pub path: PathBuf,
    /// Manual intent override, repeatable (ping_sweep, top_1k_tcp, all_tcp, top_udp, vuln_nse).
    #[arg(long = "intent", value_name = "KIND")]
    pub intents: Vec<String>,
    /// Friendly label for the scanning host/operator.
    #[arg(long)]
    pub scanner_label: Option<String>,
    /// Manual override when the scan's source IP can't be inferred from argv.
    #[arg(long)]
    pub source_ip: Option<String>,
    /// Manual override when the scan's source port can't be inferred from argv.
    #[arg(long)]
    pub source_port: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct HostsArgs {
    /// Project id.
    pub project_id: String,
    /// Only in-scope ("true") or out-of-scope ("false") hosts.
    #[arg(long)]
    pub in_scope: Option<bool>,
    /// Filter by latest_scan value (none, ping, top-1k, full-port).
    #[arg(long)]
    pub latest_scan: Option<String>,
    /// Case-insensitive substring match against IP or hostname.
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// Project id.
    pub project_id: String,
    #[command(flatten)]
    pub preview: PreviewOptionsArgs,
}

#[derive(clap::Args, Debug)]
pub struct PreviewOptionsArgs {
    /// How many rows each preview list carries (defaults to config's analytics.default_preview_size).
    #[arg(long)]
    pub preview_size: Option<usize>,
    /// Omit the truncated lists entirely, keeping only the counts.
    #[arg(long)]
    pub no_lists: bool,
}
