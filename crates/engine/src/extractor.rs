//! Marker extraction: scans raw stress-test log text for crash markers,
//! not-responding markers, and generic exception lines, and produces
//! unscored [`ErrorRecord`]s with bounded context windows.
//!
//! Extraction never fails on malformed input. A marker whose required
//! captures are missing, or whose context window comes back empty, is
//! skipped rather than emitted.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;
use triage_core::{ErrorCategory, ErrorRecord};

static CRASH_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"// CRASH: (.+?) \(pid (\d+)\)").unwrap());

static ANR_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"// NOT RESPONDING: (.+?) \(pid (\d+)\)").unwrap());

static PROCESS_CONTEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Process: ([^,]+), PID: (\d+)").unwrap());

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z][a-z0-9_]*(?:\.[a-z][a-z0-9_]*)+)").unwrap());

static BUILD_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Build Time:\s*(\d{13})").unwrap());

static STANDARD_TS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})").unwrap());

/// Lines containing any of these tokens trigger a generic exception record.
const EXCEPTION_KEYWORDS: [&str; 4] = ["Exception", "Error", "Fatal", "FAILED"];

/// Hard cap on the retained-line count of a marker context window.
const MAX_CONTEXT_LINES: usize = 20;
/// A blank line only terminates a window once it holds more than this many lines.
const MIN_LINES_BEFORE_BLANK_STOP: usize = 5;
/// Exception windows span this many lines before the trigger line...
const EXCEPTION_LINES_BEFORE: usize = 2;
/// ...through this many after it (exclusive bound on the trigger index).
const EXCEPTION_LINES_AFTER: usize = 5;

/// Character caps applied when embedding the crash capture blocks.
const ERROR_SECTION_CAP: usize = 500;
const STACK_TRACE_CAP: usize = 1000;

/// Derive a record timestamp from surrounding text.
///
/// Preference order: an embedded build timestamp (13-digit unix
/// milliseconds), then an embedded `YYYY-MM-DD HH:MM:SS` timestamp, then the
/// supplied analysis time. The fallback carries no log-time precision.
pub fn extract_timestamp(text: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(caps) = BUILD_TIME_RE.captures(text) {
        if let Ok(ms) = caps[1].parse::<i64>() {
            if let Some(ts) = Utc.timestamp_millis_opt(ms).single() {
                return ts;
            }
        }
    }
    if let Some(caps) = STANDARD_TS_RE.captures(text) {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S") {
            return naive.and_utc();
        }
    }
    fallback
}

fn cap_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub struct Extractor<'a> {
    lines: Vec<&'a str>,
    text: &'a str,
    analysis_time: DateTime<Utc>,
}

impl<'a> Extractor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_analysis_time(text, Utc::now())
    }

    /// Pin the timestamp fallback, e.g. for deterministic tests.
    pub fn with_analysis_time(text: &'a str, analysis_time: DateTime<Utc>) -> Self {
        Self {
            lines: text.lines().collect(),
            text,
            analysis_time,
        }
    }

    /// Run all three marker families over the log.
    pub fn extract(&self) -> Vec<ErrorRecord> {
        let mut records = self.find_crashes();
        records.extend(self.find_anrs());
        records.extend(self.find_exceptions());
        records
    }

    /// Locate every `// CRASH: <process> (pid <pid>)` marker and capture the
    /// trailing comment block and the matching exception window.
    pub fn find_crashes(&self) -> Vec<ErrorRecord> {
        let mut records = Vec::new();

        for caps in CRASH_MARKER_RE.captures_iter(self.text) {
            let process_name = caps[1].to_string();
            let pid = caps[2].to_string();
            let keyword = format!("CRASH: {}", process_name);

            let error_section = self.error_section(&keyword);
            let stack_trace = self.stack_trace_for(&process_name);
            let context = self.context_lines(&keyword);
            if context.is_empty() {
                continue;
            }

            let timestamp_source = if error_section.is_empty() {
                context.join("\n")
            } else {
                error_section.clone()
            };

            records.push(ErrorRecord {
                category: ErrorCategory::Crash,
                process_name,
                pid: Some(pid),
                timestamp: extract_timestamp(&timestamp_source, self.analysis_time),
                context,
                error_section: cap_chars(&error_section, ERROR_SECTION_CAP).to_string(),
                stack_trace: cap_chars(&stack_trace, STACK_TRACE_CAP).to_string(),
            });
        }

        records
    }

    /// Locate every `// NOT RESPONDING: <process> (pid <pid>)` marker.
    pub fn find_anrs(&self) -> Vec<ErrorRecord> {
        let mut records = Vec::new();

        for caps in ANR_MARKER_RE.captures_iter(self.text) {
            let process_name = caps[1].to_string();
            let pid = caps[2].to_string();
            let keyword = format!("NOT RESPONDING: {}", process_name);

            let context = self.context_lines(&keyword);
            if context.is_empty() {
                continue;
            }

            let timestamp_source = context.join("\n");
            records.push(ErrorRecord {
                category: ErrorCategory::Anr,
                process_name,
                pid: Some(pid),
                timestamp: extract_timestamp(&timestamp_source, self.analysis_time),
                context,
                error_section: String::new(),
                stack_trace: String::new(),
            });
        }

        records
    }

    /// Scan every line for exception keywords and emit a short surrounding
    /// window per trigger line.
    pub fn find_exceptions(&self) -> Vec<ErrorRecord> {
        let mut records = Vec::new();

        for (i, line) in self.lines.iter().enumerate() {
            if !EXCEPTION_KEYWORDS.iter().any(|kw| line.contains(kw)) {
                continue;
            }

            let start = i.saturating_sub(EXCEPTION_LINES_BEFORE);
            let end = (i + EXCEPTION_LINES_AFTER).min(self.lines.len());
            let context: Vec<String> =
                self.lines[start..end].iter().map(|l| l.to_string()).collect();
            if context.is_empty() {
                continue;
            }

            let window_text = context.join("\n");
            let process_name = extract_process_from_context(&window_text);
            let timestamp_source = format!("{}\n{}", window_text, line);

            records.push(ErrorRecord {
                category: ErrorCategory::Exception,
                process_name,
                pid: None,
                timestamp: extract_timestamp(&timestamp_source, self.analysis_time),
                context,
                error_section: String::new(),
                stack_trace: String::new(),
            });
        }

        records
    }

    /// Comment block trailing a marker: every line from the marker until the
    /// first non-comment, non-blank line (which is included as terminator).
    fn error_section(&self, keyword: &str) -> String {
        let mut section = Vec::new();
        let mut capture = false;

        for line in &self.lines {
            if line.contains(keyword) {
                capture = true;
            }
            if capture {
                section.push(*line);
                let trimmed = line.trim();
                if !trimmed.starts_with("//") && !trimmed.is_empty() {
                    break;
                }
            }
        }

        section.join("\n")
    }

    /// Exception window for a crash: starts at the first line naming the
    /// process together with an exception token, runs until a blank line once
    /// more than five lines are collected.
    fn stack_trace_for(&self, process_name: &str) -> String {
        let mut trace = Vec::new();
        let mut capture = false;

        for line in &self.lines {
            if line.contains(process_name)
                && (line.contains("Exception") || line.contains("Error"))
            {
                capture = true;
            }
            if capture {
                trace.push(*line);
                if line.trim().is_empty() && trace.len() > MIN_LINES_BEFORE_BLANK_STOP {
                    break;
                }
            }
        }

        trace.join("\n")
    }

    /// Filtered context window shared by crash and ANR markers.
    ///
    /// Starting at the marker line, retains comment lines, stack-frame lines,
    /// and exception lines; anything else is skipped without ending the
    /// window. Stops at [`MAX_CONTEXT_LINES`] retained lines, or at a blank
    /// line once more than five lines are retained. The cap is exact: a
    /// window never holds 21 lines.
    fn context_lines(&self, keyword: &str) -> Vec<String> {
        let mut context: Vec<String> = Vec::new();
        let mut capture = false;

        for line in &self.lines {
            if line.contains(keyword) {
                capture = true;
            }
            if !capture {
                continue;
            }

            let trimmed = line.trim();
            if trimmed.starts_with("//") || trimmed.starts_with("at ") {
                context.push(trimmed.to_string());
            } else if !trimmed.is_empty()
                && !trimmed.starts_with("**")
                && (line.contains("Exception") || line.contains("Error"))
            {
                context.push(trimmed.to_string());
            }

            if context.len() >= MAX_CONTEXT_LINES
                || (trimmed.is_empty() && context.len() > MIN_LINES_BEFORE_BLANK_STOP)
            {
                break;
            }
        }

        context
    }
}

/// Best-effort process attribution for a generic exception window.
fn extract_process_from_context(context: &str) -> String {
    if let Some(caps) = PROCESS_CONTEXT_RE.captures(context) {
        return format!("{} (PID: {})", &caps[1], &caps[2]);
    }
    if let Some(caps) = PACKAGE_RE.captures(context) {
        return caps[1].to_string();
    }
    "unknown".to_string()
}
