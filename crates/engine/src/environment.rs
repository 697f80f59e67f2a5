//! Environment context extraction: device build metadata, involved
//! application packages, memory pressure, and run configuration recovered
//! from the log text.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static BUILD_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Build Label: (.+?)(?:\n|//|$)").unwrap());

static BUILD_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Build Time: (\d+)").unwrap());

static CHANGELIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Build Changelist: (\d+)").unwrap());

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Process: ([\w\.]+)|CRASH: ([\w\.]+)").unwrap());

static ALLOC_FAILURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Failed to allocate (\d+) bytes").unwrap());

static EVENTS_INJECTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Events injected: (\d+)").unwrap());

#[derive(Debug, Clone, Serialize, Default)]
pub struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_label: Option<String>,
    /// Formatted `YYYY-MM-DD HH:MM:SS` from the embedded unix-ms build time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelist: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AppInfo {
    /// Packages named by crash and process markers, sorted for stable output.
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct MemoryInfo {
    pub oom_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_allocation_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_allocation_mb: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Completed,
    Aborted,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_injected: Option<u64>,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentContext {
    pub device: DeviceInfo,
    pub application: AppInfo,
    pub memory: MemoryInfo,
    pub test_config: TestConfig,
}

/// Pull every environment facet out of the raw log text.
pub fn extract(log_text: &str) -> EnvironmentContext {
    EnvironmentContext {
        device: device_info(log_text),
        application: app_info(log_text),
        memory: memory_info(log_text),
        test_config: test_config(log_text),
    }
}

fn device_info(log_text: &str) -> DeviceInfo {
    let build_time = BUILD_TIME_RE
        .captures(log_text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms))
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string());

    DeviceInfo {
        build_label: BUILD_LABEL_RE
            .captures(log_text)
            .map(|caps| caps[1].trim().to_string()),
        build_time,
        changelist: CHANGELIST_RE.captures(log_text).map(|caps| caps[1].to_string()),
    }
}

fn app_info(log_text: &str) -> AppInfo {
    let mut packages = BTreeSet::new();
    for caps in PACKAGE_RE.captures_iter(log_text) {
        if let Some(pkg) = caps.get(1).or_else(|| caps.get(2)) {
            packages.insert(pkg.as_str().to_string());
        }
    }
    AppInfo {
        packages: packages.into_iter().collect(),
    }
}

fn memory_info(log_text: &str) -> MemoryInfo {
    if !log_text.contains("OutOfMemoryError") {
        return MemoryInfo::default();
    }

    let failed_bytes = ALLOC_FAILURE_RE
        .captures(log_text)
        .and_then(|caps| caps[1].parse::<u64>().ok());

    MemoryInfo {
        oom_detected: true,
        failed_allocation_bytes: failed_bytes,
        failed_allocation_mb: failed_bytes
            .map(|bytes| (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0),
    }
}

fn test_config(log_text: &str) -> TestConfig {
    let status = if log_text.contains("Monkey finished") {
        RunStatus::Completed
    } else if log_text.contains("Monkey aborted") {
        RunStatus::Aborted
    } else {
        RunStatus::Unknown
    };

    TestConfig {
        events_injected: EVENTS_INJECTED_RE
            .captures(log_text)
            .and_then(|caps| caps[1].parse::<u64>().ok()),
        status,
    }
}
