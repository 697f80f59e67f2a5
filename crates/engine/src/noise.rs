//! Noise filter: drops records that belong to the stress-test tool's own
//! instrumentation process. Runs immediately after extraction, before any
//! signature is computed, so tool noise never reaches deduplication counts
//! or chain correlation.

use tracing::debug;
use triage_core::ErrorRecord;

/// Package and class names belonging to the stress-test tool itself.
/// Matching is substring-based and case-sensitive.
pub const TOOL_INTERNAL_PATTERNS: [&str; 6] = [
    "flipjava.io",
    "com.android.commands.monkey",
    "android.app.Instrumentation",
    "/system/bin/monkey",
    "MonkeySourceNetwork",
    "MonkeySourceRandom",
];

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    patterns: Vec<String>,
}

impl NoiseFilter {
    pub fn new() -> Self {
        Self {
            patterns: TOOL_INTERNAL_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// True when the process name or any captured text names the tool itself.
    pub fn is_tool_internal(&self, process_name: &str, context: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| process_name.contains(p.as_str()) || context.contains(p.as_str()))
    }

    /// Drop tool-internal records, keeping input order.
    pub fn filter(&self, records: Vec<ErrorRecord>) -> Vec<ErrorRecord> {
        records
            .into_iter()
            .filter(|record| {
                let internal =
                    self.is_tool_internal(&record.process_name, &record.searchable_text());
                if internal {
                    debug!(
                        process = %record.process_name,
                        category = record.category.as_str(),
                        "dropping tool-internal record"
                    );
                }
                !internal
            })
            .collect()
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use triage_core::ErrorCategory;

    fn record(process: &str, context_line: &str) -> ErrorRecord {
        ErrorRecord {
            category: ErrorCategory::Exception,
            process_name: process.to_string(),
            pid: None,
            timestamp: Utc::now(),
            context: vec![context_line.to_string()],
            error_section: String::new(),
            stack_trace: String::new(),
        }
    }

    #[test]
    fn internal_process_name_is_dropped() {
        let filter = NoiseFilter::new();
        let records = vec![
            record("flipjava.io.monkey", "some context"),
            record("com.example.app", "some context"),
        ];
        let kept = filter.filter(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].process_name, "com.example.app");
    }

    #[test]
    fn internal_context_is_dropped() {
        let filter = NoiseFilter::new();
        let records = vec![record(
            "com.example.app",
            "at com.android.commands.monkey.Monkey.run(Monkey.java:599)",
        )];
        assert!(filter.filter(records).is_empty());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let filter = NoiseFilter::new();
        assert!(!filter.is_tool_internal("FLIPJAVA.IO.monkey", ""));
        assert!(filter.is_tool_internal("flipjava.io.monkey", ""));
    }

    #[test]
    fn crash_capture_blocks_are_checked_too() {
        let filter = NoiseFilter::new();
        let mut rec = record("com.example.app", "clean context");
        rec.stack_trace = "at android.app.Instrumentation.sendKeySync".to_string();
        assert!(filter.filter(vec![rec]).is_empty());
    }
}
