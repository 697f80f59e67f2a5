use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deduplication metadata attached to a group representative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deduplication {
    /// Stable short hash over exception type, process name, and the first
    /// three stack-frame method identifiers.
    pub signature: String,
    pub occurrences: usize,
    #[serde(with = "crate::timestamp")]
    pub first_seen: DateTime<Utc>,
    #[serde(with = "crate::timestamp")]
    pub last_seen: DateTime<Utc>,
    /// Occurrences per elapsed minute, rounded to 2 decimals. Zero when the
    /// group has fewer than two occurrences or zero elapsed time.
    pub frequency_per_minute: f64,
}
