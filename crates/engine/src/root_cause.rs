//! Heuristic root-cause analysis: stack-frame attribution, failure-pattern
//! matching against a fixed ordered catalogue, fix suggestions, and a
//! confidence score.
//!
//! Pure function of the record's context text: identical input always yields
//! identical pattern, confidence, and suggestions.

use regex::Regex;
use std::sync::LazyLock;
use triage_core::{
    ErrorRecord, FailurePattern, Ownership, PrimaryLocation, RootCause, StackFrame,
};

static STACK_FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at ([\w\.$]+)\.(\w+)\(([\w\.]+):(\d+)\)").unwrap());

static LONG_MSG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Long Msg: (.+?)(?://|$)").unwrap());

static SNIPPET_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"property (\w+)|variable (\w+)|method (\w+)").unwrap());

/// Namespaces that classify a frame as third-party library code.
pub const THIRD_PARTY_NAMESPACES: [&str; 5] = ["okhttp", "retrofit", "glide", "gson", "kotlinx"];

/// One entry of the failure-pattern catalogue. Keyword matching is
/// case-insensitive substring containment.
struct PatternSpec {
    pattern: FailurePattern,
    keywords: &'static [&'static str],
    suggestions: &'static [&'static str],
}

/// Ordered catalogue; the first matching entry wins, so the ordering is part
/// of the contract.
const PATTERN_CATALOGUE: [PatternSpec; 6] = [
    PatternSpec {
        pattern: FailurePattern::UninitializedLateinit,
        keywords: &["UninitializedPropertyAccessException", "lateinit property"],
        suggestions: &[
            "Guard the access with ::property.isInitialized",
            "Initialize the property in the constructor or an init block",
            "Consider a nullable type instead of lateinit",
        ],
    },
    PatternSpec {
        pattern: FailurePattern::NullPointer,
        keywords: &["NullPointerException", "null object reference"],
        suggestions: &[
            "Use the safe-call operator ?.",
            "Add a null check before the access",
            "Provide a default with the Elvis operator",
        ],
    },
    PatternSpec {
        pattern: FailurePattern::OutOfMemory,
        keywords: &["OutOfMemoryError", "Failed to allocate"],
        suggestions: &[
            "Check for memory leaks",
            "Downsample image loads with inSampleSize",
            "Release resources that are no longer used",
        ],
    },
    PatternSpec {
        pattern: FailurePattern::ResourceNotFound,
        keywords: &["Resources$NotFoundException", "Resource ID"],
        suggestions: &[
            "Verify the resource ID is correct",
            "Confirm the resource exists in every configuration",
        ],
    },
    PatternSpec {
        pattern: FailurePattern::ConcurrentModification,
        keywords: &["ConcurrentModificationException"],
        suggestions: &[],
    },
    PatternSpec {
        pattern: FailurePattern::LifecycleError,
        keywords: &[
            "IllegalStateException",
            "Can not perform this action after onSaveInstanceState",
        ],
        suggestions: &[
            "Use commitAllowingStateLoss() instead of commit()",
            "Run fragment transactions from a lifecycle-safe callback",
        ],
    },
];

const GENERIC_SUGGESTION: &str = "Inspect the full stack trace to locate the failing code";

const MAX_SUGGESTIONS: usize = 3;
const MAX_SNIPPET_FRAGMENTS: usize = 3;

/// Analyze one record's context window.
pub fn analyze(record: &ErrorRecord) -> RootCause {
    let context = record.context_text();

    let code_attribution = extract_attribution(&context);
    let primary_location = locate_primary(&context, &code_attribution);
    let pattern = match_pattern(&context);
    let fix_suggestions = fix_suggestions(pattern);
    let confidence = confidence(primary_location.as_ref(), pattern);

    RootCause {
        code_attribution,
        primary_location,
        pattern,
        fix_suggestions,
        confidence,
    }
}

/// Every `at ClassPath.method(File:Line)` frame, classified by namespace.
fn extract_attribution(context: &str) -> Vec<StackFrame> {
    STACK_FRAME_RE
        .captures_iter(context)
        .filter_map(|caps| {
            let line = caps[4].parse::<u32>().ok()?;
            let class = caps[1].to_string();
            let ownership = classify_ownership(&class);
            Some(StackFrame {
                class,
                method: caps[2].to_string(),
                file: caps[3].to_string(),
                line,
                ownership,
            })
        })
        .collect()
}

fn classify_ownership(class_path: &str) -> Ownership {
    if class_path.starts_with("android.") || class_path.starts_with("java.") {
        Ownership::System
    } else if THIRD_PARTY_NAMESPACES
        .iter()
        .any(|lib| class_path.contains(lib))
    {
        Ownership::ThirdParty
    } else {
        Ownership::Application
    }
}

/// First application-owned frame, else the first frame of any ownership.
fn locate_primary(context: &str, attribution: &[StackFrame]) -> Option<PrimaryLocation> {
    let frame = attribution
        .iter()
        .find(|frame| frame.ownership == Ownership::Application)
        .or_else(|| attribution.first())?
        .clone();

    Some(PrimaryLocation {
        frame,
        code_snippet: extract_code_snippet(context),
    })
}

/// Short code hint: prefer `Long Msg:` fields, then named
/// property/variable/method tokens; at most three fragments.
fn extract_code_snippet(context: &str) -> Option<String> {
    let mut fragments: Vec<String> = LONG_MSG_RE
        .captures_iter(context)
        .map(|caps| caps[1].to_string())
        .collect();

    for caps in SNIPPET_TOKEN_RE.captures_iter(context) {
        for group in 1..=3 {
            if let Some(m) = caps.get(group) {
                fragments.push(m.as_str().to_string());
            }
        }
    }

    if fragments.is_empty() {
        None
    } else {
        Some(
            fragments
                .into_iter()
                .take(MAX_SNIPPET_FRAGMENTS)
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

/// First catalogue entry whose keywords appear in the context, else UNKNOWN.
fn match_pattern(context: &str) -> FailurePattern {
    let context_lower = context.to_lowercase();
    PATTERN_CATALOGUE
        .iter()
        .find(|spec| {
            spec.keywords
                .iter()
                .any(|kw| context_lower.contains(&kw.to_lowercase()))
        })
        .map(|spec| spec.pattern)
        .unwrap_or(FailurePattern::Unknown)
}

/// Pattern-keyed suggestion list, at most three entries; patterns with no
/// catalogued suggestions share the generic fallback with UNKNOWN.
fn fix_suggestions(pattern: FailurePattern) -> Vec<String> {
    let catalogued = PATTERN_CATALOGUE
        .iter()
        .find(|spec| spec.pattern == pattern)
        .map(|spec| spec.suggestions)
        .unwrap_or(&[]);

    if catalogued.is_empty() {
        vec![GENERIC_SUGGESTION.to_string()]
    } else {
        catalogued
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|s| s.to_string())
            .collect()
    }
}

/// Location ownership contributes 50/30/10 (application/third-party/system or
/// absent), a recognized pattern adds 40, a snippet adds 10; clamped to 100.
fn confidence(primary: Option<&PrimaryLocation>, pattern: FailurePattern) -> u32 {
    let mut confidence = match primary {
        Some(loc) => match loc.frame.ownership {
            Ownership::Application => 50,
            Ownership::ThirdParty => 30,
            Ownership::System => 10,
        },
        None => 10,
    };

    if pattern != FailurePattern::Unknown {
        confidence += 40;
    }
    if primary.and_then(|loc| loc.code_snippet.as_ref()).is_some() {
        confidence += 10;
    }

    confidence.min(100)
}
