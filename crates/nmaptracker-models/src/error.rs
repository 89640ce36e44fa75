//! Shared error types for the NmapTracker core.

use thiserror::Error;

/// Distinct error kinds crossing the core's public boundary (spec.md §7).
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("workflow transition attempted on a port that is not open")]
    WorkflowNotOnOpenPort,

    #[error("import not found in project: {0}")]
    ImportNotFound(String),

    #[error("baseline CIDR prefix narrower than /16: {0}")]
    BaselineRangeTooBroad(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for TrackerError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.message().contains("UNIQUE constraint failed") {
                return TrackerError::Conflict(db_err.message().to_string());
            }
        }
        TrackerError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
