//! Severity scoring: a 0-100 composite of four independently capped
//! sub-scores, mapped onto a discrete priority tier.
//!
//! Scoring is a pure function of record content plus deduplication metadata;
//! reapplying it to the same record set is idempotent.

use triage_core::{
    AnalyzedError, Deduplication, ErrorCategory, ErrorRecord, Priority, SeverityDetails,
    SeverityScore,
};

/// Modules whose presence in a process name or context marks the fault as
/// hitting a critical user path.
pub const CRITICAL_MODULE_KEYWORDS: [&str; 8] = [
    "activity",
    "mainactivity",
    "launcher",
    "payment",
    "login",
    "auth",
    "application",
    "service",
];

/// Context keywords that mark a fault as blocking the user outright.
pub const BLOCKING_KEYWORDS: [&str; 5] = [
    "fatal",
    "unable to start",
    "cannot create",
    "force close",
    "application not responding",
];

/// Context keywords that mark a degraded-but-usable experience.
pub const DEGRADED_KEYWORDS: [&str; 6] =
    ["slow", "timeout", "retry", "null", "not found", "invalid"];

const SUB_SCORE_CAP: u32 = 20;
const TOTAL_CAP: u32 = 100;

/// Score one catalogue entry.
pub fn score(entry: &AnalyzedError) -> SeverityScore {
    let details = SeverityDetails {
        type_score: type_score(entry.record.category),
        impact_score: impact_score(&entry.record),
        frequency_score: frequency_score(entry.deduplication.as_ref()),
        user_impact_score: user_impact_score(&entry.record),
    };

    let total = (details.type_score
        + details.impact_score
        + details.frequency_score
        + details.user_impact_score)
        .min(TOTAL_CAP);

    SeverityScore {
        total,
        priority: Priority::from_score(total),
        details,
    }
}

/// Attach scores to every entry and order the catalogue by score descending
/// (stable, ties keep their prior order).
pub fn prioritize(entries: &mut Vec<AnalyzedError>) {
    for entry in entries.iter_mut() {
        entry.severity = Some(score(entry));
    }
    entries.sort_by(|a, b| {
        let score_a = a.severity.as_ref().map(|s| s.total).unwrap_or(0);
        let score_b = b.severity.as_ref().map(|s| s.total).unwrap_or(0);
        score_b.cmp(&score_a)
    });
}

/// Fixed table; no interpolation.
fn type_score(category: ErrorCategory) -> u32 {
    match category {
        ErrorCategory::Crash => 40,
        ErrorCategory::Anr => 30,
        ErrorCategory::Exception => 15,
    }
}

/// +10 when the fault hits the main process (no `:suffix` qualifier), +10
/// when a critical module keyword appears; capped at 20.
fn impact_score(record: &ErrorRecord) -> u32 {
    let process = record.process_name.to_lowercase();
    let context = record.context_text().to_lowercase();

    let mut score = 0;
    if !process.contains(':') {
        score += 10;
    }
    if CRITICAL_MODULE_KEYWORDS
        .iter()
        .any(|kw| process.contains(kw) || context.contains(kw))
    {
        score += 10;
    }
    score.min(SUB_SCORE_CAP)
}

/// Requires a prior deduplication pass; zero without one.
fn frequency_score(dedup: Option<&Deduplication>) -> u32 {
    let Some(dedup) = dedup else {
        return 0;
    };
    match dedup.occurrences {
        n if n >= 10 => 20,
        n if n >= 5 => 15,
        n if n >= 3 => 10,
        _ => 5,
    }
}

/// Blocking keywords outrank degraded keywords; plain faults score 5.
fn user_impact_score(record: &ErrorRecord) -> u32 {
    let context = record.context_text().to_lowercase();

    if BLOCKING_KEYWORDS.iter().any(|kw| context.contains(kw)) {
        return 20;
    }
    if DEGRADED_KEYWORDS.iter().any(|kw| context.contains(kw)) {
        return 10;
    }
    5
}
