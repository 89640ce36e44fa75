//! Facade crate: `Tracker` wiring all sub-crates together, plus
//! configuration loading.

pub use nmaptracker_analytics as analytics;
pub use nmaptracker_db as db;
pub use nmaptracker_merge as merge;
pub use nmaptracker_models as models;
pub use nmaptracker_parsers as parsers;
pub use nmaptracker_scope as scope;
pub use nmaptracker_services as services;

pub mod config;
pub mod tracker;

pub use config::{load_config, AnalyticsConfig, DatabaseConfig, LoggingConfig, ScopeConfig, TrackerConfig};
pub use tracker::{open_at, Tracker};
