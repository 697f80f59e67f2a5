//! Report output: one JSON object per catalogue entry in simple mode, a
//! single full document plus an executive-summary text file in full mode.
//!
//! Layout mirrors the capture convention: `report_<tag>/json/...` with the
//! summary text at the report root.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use triage_core::{AnalyzedError, ErrorCategory, ErrorRecord, Priority, TriageError};

use crate::pipeline::AnalysisReport;
use crate::summary;

/// Basic wire fields only, for simple per-entry files.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BasicEntry<'a> {
    category: ErrorCategory,
    process_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<&'a str>,
    #[serde(with = "triage_core::timestamp")]
    timestamp: DateTime<Utc>,
    context: &'a [String],
}

impl<'a> BasicEntry<'a> {
    fn from_record(record: &'a ErrorRecord) -> Self {
        Self {
            category: record.category,
            process_name: &record.process_name,
            pid: record.pid.as_deref(),
            timestamp: record.timestamp,
            context: &record.context,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportMeta {
    generated_at: String,
    analyzer_version: &'static str,
    total_errors: usize,
    correlation_enabled: bool,
}

#[derive(Debug, Serialize)]
struct ReportSummary {
    by_priority: BTreeMap<Priority, usize>,
    by_category: BTreeMap<ErrorCategory, usize>,
    stability_score: i64,
}

/// Full-detail document: `{meta, environment, errors, summary}`.
#[derive(Debug, Serialize)]
struct FullReport<'a> {
    meta: ReportMeta,
    environment: &'a crate::environment::EnvironmentContext,
    errors: &'a [AnalyzedError],
    summary: ReportSummary,
}

pub struct ReportWriter {
    base_dir: PathBuf,
    tag: String,
}

impl ReportWriter {
    /// Reports land in `<base>/report_<tag>/`; the tag is usually the capture
    /// directory's timestamp suffix, falling back to the current time.
    pub fn new(base: &Path, tag: Option<String>) -> Self {
        let tag = tag.unwrap_or_else(|| Utc::now().format("%Y%m%d%H%M%S").to_string());
        Self {
            base_dir: base.join(format!("report_{}", tag)),
            tag,
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write one JSON file per catalogue entry, basic fields only.
    pub fn write_simple(&self, report: &AnalysisReport) -> Result<Vec<PathBuf>, TriageError> {
        let json_dir = self.base_dir.join("json");
        create_dir(&json_dir)?;

        let mut written = Vec::new();
        for (idx, entry) in report.errors.iter().enumerate() {
            let file_name = if report.errors.len() == 1 {
                format!("report_{}.json", self.tag)
            } else {
                format!("report_{}_{}.json", self.tag, idx + 1)
            };
            let path = json_dir.join(file_name);
            let body = serde_json::to_string_pretty(&BasicEntry::from_record(&entry.record))?;
            write_file(&path, &body)?;
            written.push(path);
        }

        info!(
            files = written.len(),
            dir = %json_dir.display(),
            "wrote simple report"
        );
        Ok(written)
    }

    /// Write the full document and the executive-summary text file.
    pub fn write_full(&self, report: &AnalysisReport) -> Result<PathBuf, TriageError> {
        let json_dir = self.base_dir.join("json");
        create_dir(&json_dir)?;

        let document = FullReport {
            meta: ReportMeta {
                generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
                analyzer_version: env!("CARGO_PKG_VERSION"),
                total_errors: report.errors.len(),
                correlation_enabled: report.correlation_enabled,
            },
            environment: &report.environment,
            errors: &report.errors,
            summary: ReportSummary {
                by_priority: summary::priority_counts(&report.errors),
                by_category: summary::category_counts(&report.errors),
                stability_score: summary::stability_score(&report.errors),
            },
        };

        let path = json_dir.join(format!("report_{}_full.json", self.tag));
        write_file(&path, &serde_json::to_string_pretty(&document)?)?;

        let summary_path = self.base_dir.join(format!("report_{}_summary.txt", self.tag));
        let summary_text = summary::executive_summary(&report.errors, &report.environment);
        write_file(&summary_path, &summary_text)?;

        info!(report = %path.display(), "wrote full report");
        Ok(path)
    }
}

fn create_dir(path: &Path) -> Result<(), TriageError> {
    fs::create_dir_all(path).map_err(|source| TriageError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, body: &str) -> Result<(), TriageError> {
    fs::write(path, body).map_err(|source| TriageError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}
