use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the triage engine. Malformed log fragments are never
/// errors; they are skipped during extraction.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("failed to read log file {path}: {source}")]
    LogRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no .log file found in capture directory {0}")]
    EmptyCapture(PathBuf),

    #[error("failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
