//! Error types for slaguard.

use crate::core::types::Severity;
use thiserror::Error;

/// Result type alias for slaguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slaguard operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("no SLA policy configured for severity: {0}")]
    PolicyNotFound(Severity),

    #[error("escalation rule not found: {0}")]
    RuleNotFound(String),

    #[error("invalid rule configuration: {0}")]
    InvalidRule(String),

    // Action execution errors
    #[error("action {action} failed: {reason}")]
    ActionFailed { action: String, reason: String },

    #[error("action {action} timed out")]
    ActionTimeout { action: String },

    // Engine errors
    #[error("execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("breach not found: {0}")]
    BreachNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.to_string())
    }
}
