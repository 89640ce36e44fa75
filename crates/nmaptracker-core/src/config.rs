//! Layered TOML configuration loading via the `config` crate.
//!
//! Load order: `{config_dir}/default.toml` (required) -> `local.toml`
//! (optional) -> environment variables prefixed `NMAPTRACKER` with a `__`
//! separator.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration for the tracker.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    pub database: DatabaseConfig,
    pub scope: ScopeConfig,
    pub logging: LoggingConfig,
    pub analytics: AnalyticsConfig,
}

/// Where the single SQLite file lives (spec.md §6 "persistence layout").
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// The default policy for [`nmaptracker_scope::ScopeMatcher::compile`]
/// when a project has no matching include rule (spec.md §4.1, §9 Open
/// Question: include/exclude with an `allow_all_by_default` flag, never
/// the allow-list-only form).
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    pub allow_all_by_default: bool,
}

/// Logging configuration consumed by the CLI's `tracing-subscriber` setup.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Default preview sizes for gap/delta analytics when a caller doesn't
/// specify one explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    pub default_preview_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "nmaptracker.db".to_string() },
            scope: ScopeConfig { allow_all_by_default: true },
            logging: LoggingConfig { level: "info".to_string() },
            analytics: AnalyticsConfig { default_preview_size: 10 },
        }
    }
}

/// Load configuration from TOML files and environment variables.
///
/// Load order:
/// 1. `{config_dir}/default.toml` (required)
/// 2. `{config_dir}/local.toml` (optional)
/// 3. Environment variables with prefix `NMAPTRACKER` and separator `__`
///    (e.g. `NMAPTRACKER__DATABASE__PATH`).
///
/// If `config_dir` is `None`, defaults to `"config"` relative to the
/// current directory.
pub fn load_config(config_dir: Option<&Path>) -> Result<TrackerConfig, config::ConfigError> {
    let dir = config_dir.map(|p| p.to_path_buf()).unwrap_or_else(|| std::path::PathBuf::from("config"));

    let default_path = dir.join("default.toml");
    let local_path = dir.join("local.toml");

    let builder = config::Config::builder()
        .add_source(config::File::from(default_path).required(true))
        .add_source(config::File::from(local_path).required(false))
        .add_source(config::Environment::with_prefix("NMAPTRACKER").separator("__").try_parsing(true));

    let loaded = builder.build()?;
    loaded.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_dir() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates/
        dir.pop(); // workspace root
        dir.join("config")
    }

    #[test]
    fn test_load_default_config() {
        let cfg = load_config(Some(&config_dir())).unwrap();
        assert_eq!(cfg.database.path, "nmaptracker.db");
        assert!(cfg.scope.allow_all_by_default);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.analytics.default_preview_size, 10);
    }

    #[test]
    fn test_load_config_missing_dir_fails() {
        let result = load_config(Some(Path::new("/nonexistent/path/to/config")));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_impl_matches_shipped_default_toml() {
        let cfg = load_config(Some(&config_dir())).unwrap();
        let default = TrackerConfig::default();
        assert_eq!(cfg.database.path, default.database.path);
        assert_eq!(cfg.scope.allow_all_by_default, default.scope.allow_all_by_default);
    }
}
