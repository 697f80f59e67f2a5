//! Executive summary: stability score, per-priority breakdown, and
//! recommendations derived from the final catalogue.

use std::collections::BTreeMap;
use triage_core::{AnalyzedError, ErrorCategory, Priority};

use crate::environment::EnvironmentContext;

/// Count cap on the flat error-count deduction.
const ERROR_COUNT_DEDUCTION_CAP: i64 = 40;
/// Listed CRITICAL entries in the summary text.
const TOP_CRITICAL_LISTED: usize = 3;
const MAX_RECOMMENDATIONS: usize = 5;

pub fn priority_counts(entries: &[AnalyzedError]) -> BTreeMap<Priority, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        if let Some(severity) = &entry.severity {
            *counts.entry(severity.priority).or_insert(0) += 1;
        }
    }
    counts
}

pub fn category_counts(entries: &[AnalyzedError]) -> BTreeMap<ErrorCategory, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.record.category).or_insert(0) += 1;
    }
    counts
}

/// 0-100 stability score: 100 minus an error-count deduction (2 per error,
/// capped at 40), minus a per-record priority-weighted deduction
/// (10/5/2/1), minus a high-frequency penalty (-5 for >10 occurrences,
/// -3 for >5), floored at 0. An empty catalogue scores 100.
pub fn stability_score(entries: &[AnalyzedError]) -> i64 {
    let mut score: i64 = 100;

    if !entries.is_empty() {
        score -= (entries.len() as i64 * 2).min(ERROR_COUNT_DEDUCTION_CAP);
    }

    for entry in entries {
        let priority = entry
            .severity
            .as_ref()
            .map(|s| s.priority)
            .unwrap_or(Priority::Low);
        score -= match priority {
            Priority::Critical => 10,
            Priority::High => 5,
            Priority::Medium => 2,
            Priority::Low => 1,
        };
    }

    for entry in entries {
        let occurrences = entry.occurrences();
        if occurrences > 10 {
            score -= 5;
        } else if occurrences > 5 {
            score -= 3;
        }
    }

    score.max(0)
}

/// Up to five recommendation strings driven by priority counts, high-frequency
/// records, out-of-memory evidence, and ANR presence.
pub fn recommendations(entries: &[AnalyzedError]) -> Vec<String> {
    let counts = priority_counts(entries);
    let mut recs = Vec::new();

    let critical = counts.get(&Priority::Critical).copied().unwrap_or(0);
    if critical > 0 {
        recs.push(format!(
            "Fix the {} critical error(s) immediately; they make the application unusable",
            critical
        ));
    }

    let high = counts.get(&Priority::High).copied().unwrap_or(0);
    if high > 0 {
        recs.push(format!(
            "Fix the {} high-priority error(s) this week before they reach users",
            high
        ));
    }

    let high_frequency = entries.iter().filter(|e| e.occurrences() > 5).count();
    if high_frequency > 0 {
        recs.push(format!(
            "Prioritize the {} high-frequency error(s); they are the easiest for users to hit",
            high_frequency
        ));
    }

    if entries
        .iter()
        .any(|e| e.context_text().contains("OutOfMemoryError"))
    {
        recs.push("Run a heap profiler to track down the memory leak behind the OOM".to_string());
    }

    if entries
        .iter()
        .any(|e| e.record.category == ErrorCategory::Anr)
    {
        recs.push("Move long-running work off the main thread to clear the ANRs".to_string());
    }

    if recs.is_empty() {
        recs.push("Keep the current test coverage and continue monitoring stability".to_string());
    }

    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

/// Render the human-readable executive summary for one analysis run.
pub fn executive_summary(entries: &[AnalyzedError], environment: &EnvironmentContext) -> String {
    let mut out = Vec::new();
    let rule = "=".repeat(80);

    out.push(rule.clone());
    out.push("Stress-test execution summary".to_string());
    out.push(rule.clone());
    out.push(format!(
        "Generated at: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push(format!("Errors analyzed: {}", entries.len()));
    out.push(String::new());

    if let Some(label) = &environment.device.build_label {
        out.push(format!("Device: {}", label));
    }
    if let Some(build_time) = &environment.device.build_time {
        out.push(format!("Build time: {}", build_time));
    }
    if let Some(events) = environment.test_config.events_injected {
        out.push(format!("Events injected: {}", events));
    }
    out.push(format!("Run status: {:?}", environment.test_config.status));
    out.push(String::new());

    if entries.is_empty() {
        out.push("No errors found.".to_string());
    } else {
        let counts = priority_counts(entries);
        out.push("Severity breakdown".to_string());
        out.push(format!(
            "  critical: {}  high: {}  medium: {}  low: {}",
            counts.get(&Priority::Critical).copied().unwrap_or(0),
            counts.get(&Priority::High).copied().unwrap_or(0),
            counts.get(&Priority::Medium).copied().unwrap_or(0),
            counts.get(&Priority::Low).copied().unwrap_or(0),
        ));

        let critical_entries: Vec<&AnalyzedError> = entries
            .iter()
            .filter(|e| {
                e.severity
                    .as_ref()
                    .map(|s| s.priority == Priority::Critical)
                    .unwrap_or(false)
            })
            .take(TOP_CRITICAL_LISTED)
            .collect();
        for (i, entry) in critical_entries.iter().enumerate() {
            let pattern = entry
                .root_cause
                .as_ref()
                .map(|rc| rc.pattern.display_name())
                .unwrap_or("Unknown failure pattern");
            out.push(format!(
                "  {}. [{}] {} - {} ({}x)",
                i + 1,
                entry.record.category.as_str().to_uppercase(),
                entry.record.process_name,
                pattern,
                entry.occurrences(),
            ));
        }
        out.push(String::new());
    }

    let score = stability_score(entries);
    let rating = match score {
        90..=100 => "excellent",
        75..=89 => "good",
        60..=74 => "fair",
        _ => "poor",
    };
    out.push(format!("Stability score: {}/100 ({})", score, rating));
    out.push(String::new());

    out.push("Recommendations".to_string());
    for (i, rec) in recommendations(entries).iter().enumerate() {
        out.push(format!("  {}. {}", i + 1, rec));
    }
    out.push(rule);

    out.join("\n")
}
