use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run.
///
/// Per-block problems (missing JSON, non-compliant output) are never errors;
/// they become rows or classifications in the report instead.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("File not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write report: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
