//! Signature computation and deduplication: repeated occurrences of the
//! same fault collapse into one counted group.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::info;
use triage_core::{AnalyzedError, Deduplication, ErrorRecord};

static EXCEPTION_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+Exception|\w+Error)").unwrap());

static KEY_METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at ([\w\.$]+\.[\w]+)\(").unwrap());

/// Stable short signature over exception type, process name, and the first
/// three stack-frame method identifiers: sha256 of the joined parts,
/// truncated to 16 hex chars.
pub fn signature(record: &ErrorRecord) -> String {
    let context = record.context_text();

    let exception_type = EXCEPTION_TYPE_RE
        .captures(&context)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut parts = vec![exception_type, record.process_name.clone()];
    parts.extend(
        KEY_METHOD_RE
            .captures_iter(&context)
            .take(3)
            .map(|caps| caps[1].to_string()),
    );

    let mut hasher = Sha256::new();
    hasher.update(parts.join("|").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

struct Group {
    representative: ErrorRecord,
    occurrences: usize,
    first_seen: chrono::DateTime<chrono::Utc>,
    last_seen: chrono::DateTime<chrono::Utc>,
}

/// Merge records sharing a signature into counted groups.
///
/// Groups keep the first record seen as representative; every later record
/// with the same signature bumps the count and the `last_seen` bound. The
/// output preserves the invariant `sum(occurrences) == records.len()` and is
/// sorted by occurrence count descending, ties in discovery order.
pub fn deduplicate(records: Vec<ErrorRecord>) -> Vec<AnalyzedError> {
    let total = records.len();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for record in records {
        let sig = signature(&record);
        match groups.get_mut(&sig) {
            Some(group) => {
                group.occurrences += 1;
                group.last_seen = record.timestamp;
            }
            None => {
                order.push(sig.clone());
                groups.insert(
                    sig,
                    Group {
                        first_seen: record.timestamp,
                        last_seen: record.timestamp,
                        occurrences: 1,
                        representative: record,
                    },
                );
            }
        }
    }

    let mut deduplicated: Vec<AnalyzedError> = order
        .into_iter()
        .map(|sig| {
            let group = groups.remove(&sig).expect("group recorded in order");
            let mut entry = AnalyzedError::new(group.representative);
            entry.deduplication = Some(Deduplication {
                signature: sig,
                occurrences: group.occurrences,
                first_seen: group.first_seen,
                last_seen: group.last_seen,
                frequency_per_minute: frequency_per_minute(
                    group.occurrences,
                    group.first_seen,
                    group.last_seen,
                ),
            });
            entry
        })
        .collect();

    // stable: ties keep discovery order
    deduplicated.sort_by(|a, b| b.occurrences().cmp(&a.occurrences()));

    info!(
        raw = total,
        unique = deduplicated.len(),
        "deduplicated error records"
    );
    deduplicated
}

/// Zero for singleton groups and zero-duration bursts; otherwise occurrences
/// per elapsed minute rounded to 2 decimals.
fn frequency_per_minute(
    occurrences: usize,
    first_seen: chrono::DateTime<chrono::Utc>,
    last_seen: chrono::DateTime<chrono::Utc>,
) -> f64 {
    if occurrences < 2 {
        return 0.0;
    }
    let elapsed_ms = (last_seen - first_seen).num_milliseconds();
    if elapsed_ms == 0 {
        return 0.0;
    }
    let minutes = elapsed_ms as f64 / 60_000.0;
    (occurrences as f64 / minutes * 100.0).round() / 100.0
}
