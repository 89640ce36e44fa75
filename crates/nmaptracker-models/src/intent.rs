//! Scan intent model types (closed intent set, spec.md §4.3).

use serde::{Deserialize, Serialize};

/// The closed set of scan intents NmapTracker can classify an import under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    PingSweep,
    Top1kTcp,
    AllTcp,
    TopUdp,
    VulnNse,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PingSweep => "ping_sweep",
            Self::Top1kTcp => "top_1k_tcp",
            Self::AllTcp => "all_tcp",
            Self::TopUdp => "top_udp",
            Self::VulnNse => "vuln_nse",
        }
    }

    /// Parse a raw intent string, returning `None` for anything outside the
    /// closed set. Callers that must silently drop unknown intents
    /// (spec.md §4.3 `resolve`) should match on this `Option`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ping_sweep" => Some(Self::PingSweep),
            "top_1k_tcp" => Some(Self::Top1kTcp),
            "all_tcp" => Some(Self::AllTcp),
            "top_udp" => Some(Self::TopUdp),
            "vuln_nse" => Some(Self::VulnNse),
            _ => None,
        }
    }

    /// Fixed coverage-matrix column order (spec.md §4.6).
    pub const COLUMN_ORDER: [IntentKind; 5] = [
        Self::PingSweep,
        Self::Top1kTcp,
        Self::AllTcp,
        Self::TopUdp,
        Self::VulnNse,
    ];
}

/// Whether an intent was supplied by the operator or inferred automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    Manual,
    Auto,
}

impl IntentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "manual" => Self::Manual,
            _ => Self::Auto,
        }
    }
}

/// A resolved `(import, intent)` tag, unique per `(scan_import_id, intent)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScanImportIntent {
    pub scan_import_id: String,
    pub intent: String,
    pub source: String,
    pub confidence: f64,
}

impl ScanImportIntent {
    pub fn new(scan_import_id: String, intent: IntentKind, source: IntentSource, confidence: f64) -> Self {
        Self {
            scan_import_id,
            intent: intent.as_str().to_string(),
            source: source.as_str().to_string(),
            confidence,
        }
    }

    pub fn intent_enum(&self) -> Option<IntentKind> {
        IntentKind::from_str(&self.intent)
    }

    pub fn source_enum(&self) -> IntentSource {
        IntentSource::from_str_lossy(&self.source)
    }
}
