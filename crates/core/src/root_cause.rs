use serde::{Deserialize, Serialize};

/// Who owns the code behind a stack frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ownership {
    /// Platform or runtime namespaces (`android.`, `java.`).
    System,
    /// A known third-party library namespace.
    ThirdParty,
    /// Everything else: the application's own code.
    Application,
}

/// One parsed `at ClassPath.method(File:Line)` stack frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackFrame {
    pub class: String,
    pub method: String,
    pub file: String,
    pub line: u32,
    pub ownership: Ownership,
}

/// The attribution entry chosen as the most likely fault location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryLocation {
    #[serde(flatten)]
    pub frame: StackFrame,
    /// Short hint pulled from the context window, at most three fragments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

/// Closed catalogue of known failure signatures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePattern {
    UninitializedLateinit,
    NullPointer,
    OutOfMemory,
    ResourceNotFound,
    ConcurrentModification,
    LifecycleError,
    Unknown,
}

impl FailurePattern {
    pub fn display_name(&self) -> &'static str {
        match self {
            FailurePattern::UninitializedLateinit => "Uninitialized lateinit property",
            FailurePattern::NullPointer => "Null pointer dereference",
            FailurePattern::OutOfMemory => "Out of memory",
            FailurePattern::ResourceNotFound => "Missing resource",
            FailurePattern::ConcurrentModification => "Concurrent modification",
            FailurePattern::LifecycleError => "Lifecycle state violation",
            FailurePattern::Unknown => "Unknown failure pattern",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FailurePattern::UninitializedLateinit => {
                "A lateinit property was accessed before it was initialized"
            }
            FailurePattern::NullPointer => {
                "A method or field was accessed on a null reference"
            }
            FailurePattern::OutOfMemory => "The process could not allocate a new object",
            FailurePattern::ResourceNotFound => "A referenced resource does not exist",
            FailurePattern::ConcurrentModification => {
                "A collection was modified while being iterated"
            }
            FailurePattern::LifecycleError => {
                "An operation ran after the component state was saved or torn down"
            }
            FailurePattern::Unknown => "Manual stack inspection required",
        }
    }
}

/// Heuristic root-cause annotation for one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RootCause {
    /// Every parsed stack frame, in stack order.
    pub code_attribution: Vec<StackFrame>,
    /// Absent when the context holds no parseable frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_location: Option<PrimaryLocation>,
    pub pattern: FailurePattern,
    /// At most three entries.
    pub fix_suggestions: Vec<String>,
    /// 0-100.
    pub confidence: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&FailurePattern::UninitializedLateinit).unwrap(),
            "\"UNINITIALIZED_LATEINIT\""
        );
        assert_eq!(
            serde_json::to_string(&FailurePattern::NullPointer).unwrap(),
            "\"NULL_POINTER\""
        );
        assert_eq!(
            serde_json::to_string(&Ownership::ThirdParty).unwrap(),
            "\"THIRD_PARTY\""
        );
    }

    #[test]
    fn primary_location_flattens_frame() {
        let loc = PrimaryLocation {
            frame: StackFrame {
                class: "com.example.app.MainActivity".to_string(),
                method: "onCreate".to_string(),
                file: "MainActivity.kt".to_string(),
                line: 42,
                ownership: Ownership::Application,
            },
            code_snippet: None,
        };
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["class"], "com.example.app.MainActivity");
        assert_eq!(json["line"], 42);
        assert_eq!(json["ownership"], "APPLICATION");
        assert!(json.get("codeSnippet").is_none());
    }
}
