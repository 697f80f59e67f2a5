use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dedup::Deduplication;
use crate::root_cause::RootCause;
use crate::severity::SeverityScore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Crash,
    Anr,
    Exception,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Crash => "crash",
            ErrorCategory::Anr => "anr",
            ErrorCategory::Exception => "exception",
        }
    }

    /// Crash and ANR records terminate the run of the faulting process;
    /// chain correlation prefers them as chain representatives.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ErrorCategory::Crash | ErrorCategory::Anr)
    }
}

/// One observed fault occurrence extracted from a stress-test log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub category: ErrorCategory,
    pub process_name: String,
    /// Absent for generic exception records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    /// Derived from an embedded build timestamp, else an embedded standard
    /// timestamp, else the analysis time. Callers must not assume log-time
    /// precision when the fallback applied.
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Evidentiary window around the marker. Never empty for an emitted
    /// record; extraction discards records with an empty window.
    pub context: Vec<String>,
    /// Comment block trailing a crash marker. Feeds the noise filter and
    /// timestamp recovery, not the wire format.
    #[serde(skip)]
    pub error_section: String,
    /// Exception/stack window for a crash marker. Same role as
    /// `error_section`.
    #[serde(skip)]
    pub stack_trace: String,
}

impl ErrorRecord {
    /// Context window joined for keyword and signature matching.
    pub fn context_text(&self) -> String {
        self.context.join(" ")
    }

    /// Everything the noise filter may match against: the window plus the
    /// crash-only capture blocks.
    pub fn searchable_text(&self) -> String {
        let mut text = self.context.join("\n");
        if !self.error_section.is_empty() {
            text.push('\n');
            text.push_str(&self.error_section);
        }
        if !self.stack_trace.is_empty() {
            text.push('\n');
            text.push_str(&self.stack_trace);
        }
        text
    }
}

/// Catalogue entry: a record plus the annotations the pipeline stages attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedError {
    #[serde(flatten)]
    pub record: ErrorRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplication: Option<Deduplication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<SeverityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<RootCause>,
}

impl AnalyzedError {
    pub fn new(record: ErrorRecord) -> Self {
        Self {
            record,
            deduplication: None,
            severity: None,
            root_cause: None,
        }
    }

    pub fn occurrences(&self) -> usize {
        self.deduplication.as_ref().map(|d| d.occurrences).unwrap_or(1)
    }

    pub fn context_text(&self) -> String {
        self.record.context_text()
    }
}
