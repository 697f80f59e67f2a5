//! The analysis pipeline: extraction -> noise filter -> deduplication ->
//! severity scoring -> root-cause analysis -> optional chain correlation.
//!
//! Each run owns its working structures outright; nothing is shared between
//! runs, so analyses of separate log files can execute in parallel freely.

use serde::Serialize;
use tracing::info;
use triage_core::{AnalyzedError, ErrorCategory};

use crate::environment::{self, EnvironmentContext, RunStatus};
use crate::extractor::Extractor;
use crate::noise::NoiseFilter;
use crate::{chain, dedup, root_cause, severity};

#[derive(Debug, Clone, Copy)]
pub struct AnalyzerOptions {
    /// Collapse causal chains down to their representative roots.
    pub enable_correlation: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            enable_correlation: true,
        }
    }
}

/// Run-level counters mirrored into the report.
#[derive(Debug, Clone, Serialize)]
pub struct TestSummary {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_injected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub total_crashes: usize,
    pub total_anrs: usize,
    pub total_exceptions: usize,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub errors: Vec<AnalyzedError>,
    pub environment: EnvironmentContext,
    pub test_summary: TestSummary,
    pub correlation_enabled: bool,
}

pub struct Analyzer {
    noise: NoiseFilter,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            noise: NoiseFilter::new(),
            options,
        }
    }

    /// Analyze one log's worth of text into an annotated error catalogue.
    ///
    /// An empty or marker-free log is not an error: the run completes with an
    /// empty catalogue.
    pub fn analyze(&self, log_text: &str) -> AnalysisReport {
        let extractor = Extractor::new(log_text);
        let raw = extractor.extract();
        info!(records = raw.len(), "extraction complete");

        let filtered = self.noise.filter(raw);
        let crashes = count_category(&filtered, ErrorCategory::Crash);
        let anrs = count_category(&filtered, ErrorCategory::Anr);
        let exceptions = count_category(&filtered, ErrorCategory::Exception);

        let mut entries = dedup::deduplicate(filtered);
        severity::prioritize(&mut entries);
        for entry in entries.iter_mut() {
            entry.root_cause = Some(root_cause::analyze(&entry.record));
        }

        let errors = if self.options.enable_correlation {
            chain::correlate(entries)
        } else {
            entries
        };
        info!(catalogue = errors.len(), "analysis complete");

        let environment = environment::extract(log_text);
        let test_summary = TestSummary {
            status: environment.test_config.status,
            events_injected: environment.test_config.events_injected,
            abort_reason: log_text
                .contains("Monkey aborted due to error")
                .then(|| "aborted due to error".to_string()),
            total_crashes: crashes,
            total_anrs: anrs,
            total_exceptions: exceptions,
        };

        AnalysisReport {
            errors,
            environment,
            test_summary,
            correlation_enabled: self.options.enable_correlation,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerOptions::default())
    }
}

fn count_category(records: &[triage_core::ErrorRecord], category: ErrorCategory) -> usize {
    records.iter().filter(|r| r.category == category).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::Priority;

    const CRASH_LOG: &str = "\
// CRASH: com.example.app (pid 1234)\n\
// Short Msg: java.lang.NullPointerException\n\
// Long Msg: java.lang.NullPointerException: Attempt to invoke virtual method\n\
java.lang.NullPointerException: Attempt to invoke on com.example.app\n\
at com.example.app.MainActivity.onCreate(MainActivity.kt:42)\n\
at com.example.app.Launcher.start(Launcher.kt:17)\n\
at android.app.Activity.performCreate(Activity.java:8000)\n\
at android.app.ActivityThread.handleLaunchActivity(ActivityThread.java:3245)\n\
at java.lang.reflect.Method.invoke(Method.java:372)\n\
at com.android.internal.os.ZygoteInit.main(ZygoteInit.java:698)\n";

    #[test]
    fn crash_log_produces_annotated_crash_record() {
        let report = Analyzer::default().analyze(CRASH_LOG);

        let crash = report
            .errors
            .iter()
            .find(|e| e.record.category == ErrorCategory::Crash)
            .expect("crash record in catalogue");
        assert_eq!(crash.record.process_name, "com.example.app");

        let severity = crash.severity.as_ref().unwrap();
        assert_eq!(severity.details.type_score, 40);

        let root_cause = crash.root_cause.as_ref().unwrap();
        assert_eq!(
            root_cause.pattern,
            triage_core::FailurePattern::NullPointer
        );
        assert!(crash.deduplication.is_some());
    }

    #[test]
    fn correlation_collapses_the_derived_exception_records() {
        let with = Analyzer::new(AnalyzerOptions {
            enable_correlation: true,
        })
        .analyze(CRASH_LOG);
        let without = Analyzer::new(AnalyzerOptions {
            enable_correlation: false,
        })
        .analyze(CRASH_LOG);

        assert!(with.errors.len() <= without.errors.len());
        // the crash survives as a chain root
        assert!(with
            .errors
            .iter()
            .any(|e| e.record.category == ErrorCategory::Crash));
    }

    #[test]
    fn empty_log_completes_with_empty_catalogue() {
        let report = Analyzer::default().analyze("");
        assert!(report.errors.is_empty());
        assert_eq!(report.test_summary.total_crashes, 0);
        assert_eq!(report.test_summary.status, RunStatus::Unknown);
        assert_eq!(crate::summary::stability_score(&report.errors), 100);
    }

    #[test]
    fn tool_internal_noise_never_reaches_the_catalogue() {
        let log = "\
// CRASH: flipjava.io.monkey (pid 4321)\n\
// Short Msg: java.lang.RuntimeException\n\
java.lang.RuntimeException in flipjava.io.monkey\n\
at flipjava.io.monkey.Core.next(Core.java:44)\n";
        let report = Analyzer::default().analyze(log);
        assert!(report
            .errors
            .iter()
            .all(|e| !e.record.process_name.contains("flipjava.io")));
        assert_eq!(report.test_summary.total_crashes, 0);
    }

    #[test]
    fn dedup_counts_cover_every_surviving_record() {
        let mut log = String::new();
        for _ in 0..3 {
            log.push_str(CRASH_LOG);
            log.push('\n');
        }
        let report = Analyzer::new(AnalyzerOptions {
            enable_correlation: false,
        })
        .analyze(&log);

        let crashes = report.test_summary.total_crashes;
        let anrs = report.test_summary.total_anrs;
        let exceptions = report.test_summary.total_exceptions;
        let occurrence_sum: usize = report.errors.iter().map(|e| e.occurrences()).sum();
        assert_eq!(occurrence_sum, crashes + anrs + exceptions);
    }

    #[test]
    fn catalogue_is_sorted_by_severity_without_correlation() {
        let report = Analyzer::new(AnalyzerOptions {
            enable_correlation: false,
        })
        .analyze(CRASH_LOG);
        let totals: Vec<u32> = report
            .errors
            .iter()
            .map(|e| e.severity.as_ref().unwrap().total)
            .collect();
        assert!(totals.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(
            report.errors[0].severity.as_ref().unwrap().priority,
            Priority::from_score(totals[0])
        );
    }
}
