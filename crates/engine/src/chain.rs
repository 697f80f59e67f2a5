//! Chain correlation: one underlying fault frequently surfaces as several
//! log entries (an exception followed by the crash it caused). This pass
//! groups temporally and causally related records and keeps one
//! representative root per chain.
//!
//! Relatedness is evaluated against each chain's anchor only, never between
//! later members; the predicate is symmetric but not transitive, and the
//! anchor-only evaluation is part of the output contract.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;
use triage_core::AnalyzedError;

static EXCEPTION_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+Exception|\w+Error)").unwrap());

static SHORT_MSG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Short Msg: (.+?)(?://|$)").unwrap());

static LONG_MSG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Long Msg: (.+?)(?://|$)").unwrap());

static LATEINIT_PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lateinit property (\w+)").unwrap());

static KEY_METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at ([\w\.$]+\.[\w]+)\(").unwrap());

static STACK_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at ([\w\.$]+)\.").unwrap());

/// Records further apart than this are never chained.
const CHAIN_WINDOW_SECONDS: i64 = 5;
/// Minimum shared fully-qualified classes for a call-stack relation.
const MIN_SHARED_STACK_CLASSES: usize = 2;

/// Collapse the catalogue to one representative record per causal chain.
///
/// Records are walked in timestamp order; each unvisited record anchors a new
/// chain and claims every later unvisited record related to it. The output
/// count is always <= the input count, and every emitted record is a member
/// of its chain.
pub fn correlate(entries: Vec<AnalyzedError>) -> Vec<AnalyzedError> {
    if entries.is_empty() {
        return entries;
    }
    let total = entries.len();

    let mut sorted = entries;
    sorted.sort_by_key(|e| e.record.timestamp);

    let mut visited = vec![false; sorted.len()];
    let mut roots = Vec::new();

    for i in 0..sorted.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let mut chain = vec![i];
        for j in (i + 1)..sorted.len() {
            if visited[j] {
                continue;
            }
            if related(&sorted[i], &sorted[j]) {
                chain.push(j);
                visited[j] = true;
            }
        }

        roots.push(select_root(&sorted, &chain));
    }

    info!(
        input = total,
        chains = roots.len(),
        filtered = total - roots.len(),
        "collapsed causal chains"
    );

    let root_set: std::collections::HashSet<usize> = roots.iter().copied().collect();
    let mut kept = Vec::with_capacity(roots.len());
    for (idx, entry) in sorted.into_iter().enumerate() {
        if root_set.contains(&idx) {
            kept.push(entry);
        }
    }
    kept
}

/// Two records belong to one chain when they are close in time, their
/// processes are related, and they share error features or stack frames.
fn related(anchor: &AnalyzedError, candidate: &AnalyzedError) -> bool {
    if !within_window(anchor.record.timestamp, candidate.record.timestamp) {
        return false;
    }
    if !process_related(&anchor.record.process_name, &candidate.record.process_name) {
        return false;
    }

    let context_a = anchor.context_text();
    let context_b = candidate.context_text();
    let features_a = ErrorFeatures::extract(&context_a);
    let features_b = ErrorFeatures::extract(&context_b);

    features_a.overlaps(&features_b) || call_stack_related(&context_a, &context_b)
}

fn within_window(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (b - a).num_milliseconds().abs() <= CHAIN_WINDOW_SECONDS * 1000
}

/// Identical names, one containing the other, or the first three dot-separated
/// segments matching (components of the same application).
fn process_related(process_a: &str, process_b: &str) -> bool {
    if process_a.is_empty() || process_b.is_empty() {
        return false;
    }
    if process_a == process_b {
        return true;
    }
    if process_a.contains(process_b) || process_b.contains(process_a) {
        return true;
    }

    let segments_a: Vec<&str> = process_a.split('.').collect();
    let segments_b: Vec<&str> = process_b.split('.').collect();
    segments_a.len() >= 3 && segments_b.len() >= 3 && segments_a[..3] == segments_b[..3]
}

struct ErrorFeatures {
    exception_types: Vec<String>,
    error_messages: Vec<String>,
    key_methods: Vec<String>,
}

impl ErrorFeatures {
    fn extract(context: &str) -> Self {
        let exception_types = EXCEPTION_TYPE_RE
            .captures_iter(context)
            .map(|caps| caps[1].to_string())
            .collect();

        let mut error_messages: Vec<String> = Vec::new();
        for re in [&*SHORT_MSG_RE, &*LONG_MSG_RE, &*LATEINIT_PROPERTY_RE] {
            error_messages.extend(re.captures_iter(context).map(|caps| caps[1].to_string()));
        }

        let key_methods = KEY_METHOD_RE
            .captures_iter(context)
            .take(3)
            .map(|caps| caps[1].to_string())
            .collect();

        Self {
            exception_types,
            error_messages,
            key_methods,
        }
    }

    /// Shared exception type, one message containing the other, or a shared
    /// key method among the first three.
    fn overlaps(&self, other: &Self) -> bool {
        if self
            .exception_types
            .iter()
            .any(|t| other.exception_types.contains(t))
        {
            return true;
        }

        for msg_a in &self.error_messages {
            for msg_b in &other.error_messages {
                if !msg_a.is_empty()
                    && !msg_b.is_empty()
                    && (msg_a.contains(msg_b.as_str()) || msg_b.contains(msg_a.as_str()))
                {
                    return true;
                }
            }
        }

        self.key_methods
            .iter()
            .any(|m| other.key_methods.contains(m))
    }
}

/// At least two fully-qualified classes shared between the two stacks.
fn call_stack_related(context_a: &str, context_b: &str) -> bool {
    let classes_a: std::collections::HashSet<String> = STACK_CLASS_RE
        .captures_iter(context_a)
        .map(|caps| caps[1].to_string())
        .collect();
    if classes_a.is_empty() {
        return false;
    }
    let classes_b: std::collections::HashSet<String> = STACK_CLASS_RE
        .captures_iter(context_b)
        .map(|caps| caps[1].to_string())
        .collect();

    classes_a.intersection(&classes_b).count() >= MIN_SHARED_STACK_CLASSES
}

/// Pick the chain's representative root.
///
/// A crash or ANR member wins (chronologically earliest); otherwise the
/// member with the deepest stack hint, earliest timestamp breaking ties.
fn select_root(sorted: &[AnalyzedError], chain: &[usize]) -> usize {
    if chain.len() == 1 {
        return chain[0];
    }

    if let Some(&idx) = chain
        .iter()
        .find(|&&idx| sorted[idx].record.category.is_terminal())
    {
        return idx;
    }

    let max_depth = chain
        .iter()
        .map(|&idx| stack_depth_hint(&sorted[idx]))
        .max()
        .unwrap_or(0);
    *chain
        .iter()
        .find(|&&idx| stack_depth_hint(&sorted[idx]) == max_depth)
        .expect("chain is non-empty")
}

/// Literal ` at ` occurrences in the context as a proxy for stack depth.
///
/// A textual heuristic, not a structural frame count; it can misrank when
/// context windows were truncated at their line caps. Kept behind this
/// function so a structural count can replace it without touching the
/// grouping walk.
fn stack_depth_hint(entry: &AnalyzedError) -> usize {
    entry.context_text().matches(" at ").count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use triage_core::{AnalyzedError, ErrorCategory, ErrorRecord};

    fn entry(
        category: ErrorCategory,
        process: &str,
        context: &[&str],
        offset_secs: i64,
    ) -> AnalyzedError {
        let base = Utc.with_ymd_and_hms(2025, 11, 29, 10, 0, 0).unwrap();
        AnalyzedError::new(ErrorRecord {
            category,
            process_name: process.to_string(),
            pid: Some("1".to_string()),
            timestamp: base + chrono::Duration::seconds(offset_secs),
            context: context.iter().map(|s| s.to_string()).collect(),
            error_section: String::new(),
            stack_trace: String::new(),
        })
    }

    #[test]
    fn exception_and_crash_merge_with_crash_as_root() {
        let exception = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.lang.IllegalStateException: not attached to a context"],
            0,
        );
        let crash = entry(
            ErrorCategory::Crash,
            "com.example.app",
            &[
                "// Short Msg: java.lang.IllegalStateException",
                "at com.example.app.MainActivity.onResume(MainActivity.kt:77)",
            ],
            2,
        );
        let kept = correlate(vec![exception, crash]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].record.category, ErrorCategory::Crash);
    }

    #[test]
    fn records_outside_five_second_window_stay_separate() {
        let a = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.lang.IllegalStateException"],
            0,
        );
        let b = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.lang.IllegalStateException"],
            6,
        );
        assert_eq!(correlate(vec![a, b]).len(), 2);
    }

    #[test]
    fn five_seconds_exactly_is_inside_the_window() {
        let a = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.lang.IllegalStateException"],
            0,
        );
        let b = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.lang.IllegalStateException"],
            5,
        );
        assert_eq!(correlate(vec![a, b]).len(), 1);
    }

    #[test]
    fn unrelated_processes_stay_separate() {
        let a = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.lang.IllegalStateException"],
            0,
        );
        let b = entry(
            ErrorCategory::Exception,
            "org.other.tool",
            &["java.lang.IllegalStateException"],
            1,
        );
        assert_eq!(correlate(vec![a, b]).len(), 2);
    }

    #[test]
    fn process_relation_accepts_shared_first_three_segments() {
        assert!(process_related("com.example.app.ui", "com.example.app.worker"));
        assert!(process_related("com.example.app", "com.example.app:remote"));
        assert!(!process_related("com.example.app", "com.example.other"));
        assert!(!process_related("", "com.example.app"));
    }

    #[test]
    fn shared_stack_classes_relate_records_without_shared_exception_type() {
        let a = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &[
                "some FAILED marker",
                "at com.example.app.net.Client.call(Client.kt:10)",
                "at com.example.app.ui.Screen.render(Screen.kt:20)",
            ],
            0,
        );
        let b = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &[
                "another FAILED marker",
                "at com.example.app.net.Client.retry(Client.kt:31)",
                "at com.example.app.ui.Screen.refresh(Screen.kt:44)",
            ],
            1,
        );
        assert_eq!(correlate(vec![a, b]).len(), 1);
    }

    #[test]
    fn deepest_stack_wins_when_no_terminal_record_present() {
        let shallow = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.io.IOException: read failed"],
            0,
        );
        let deep = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &[
                "java.io.IOException: read failed",
                " at com.example.app.net.Client.call(Client.kt:10)",
                " at com.example.app.net.Retry.run(Retry.kt:5)",
                " at com.example.app.ui.Screen.load(Screen.kt:9)",
            ],
            1,
        );
        let kept = correlate(vec![shallow, deep]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].context_text().matches(" at ").count(), 3);
    }

    #[test]
    fn relation_is_anchor_only_not_transitive() {
        // b relates to anchor a; c relates to b but not to a, so c opens its
        // own chain even though a human might chain all three
        let a = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.io.IOException: stage one"],
            0,
        );
        let b = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["java.io.IOException: stage two", "TimeoutError: slow backend"],
            1,
        );
        let c = entry(
            ErrorCategory::Exception,
            "com.example.app",
            &["TimeoutError: slow backend again"],
            2,
        );
        let kept = correlate(vec![a, b, c]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn every_root_is_a_chain_member_and_count_never_grows() {
        let entries: Vec<AnalyzedError> = (0..4)
            .map(|i| {
                entry(
                    ErrorCategory::Exception,
                    "com.example.app",
                    &["java.lang.NullPointerException"],
                    i * 2,
                )
            })
            .collect();
        let input_len = entries.len();
        let kept = correlate(entries);
        assert!(kept.len() <= input_len);
        assert!(!kept.is_empty());
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(correlate(Vec::new()).is_empty());
    }
}
