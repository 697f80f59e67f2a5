use serde::{Deserialize, Serialize};

/// Priority tier derived from the composite severity score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Fixed step function on the composite score: >=80 critical, >=60 high,
    /// >=40 medium, else low.
    pub fn from_score(total: u32) -> Self {
        if total >= 80 {
            Priority::Critical
        } else if total >= 60 {
            Priority::High
        } else if total >= 40 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

/// The four independently capped sub-scores behind a composite score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityDetails {
    pub type_score: u32,
    pub impact_score: u32,
    pub frequency_score: u32,
    pub user_impact_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityScore {
    /// Sum of the sub-scores, clamped to 100.
    pub total: u32,
    pub priority: Priority,
    pub details: SeverityDetails,
}
