//! Capture-directory handling: lossy log loading, sibling device-log
//! directory discovery, and batch scanning for `monkey_logs_*` folders.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use triage_core::TriageError;

const CAPTURE_DIR_PREFIX: &str = "monkey_logs_";
const DEVICE_LOG_DIR_PREFIX: &str = "logcat_logs_";

/// One loaded log capture.
#[derive(Debug, Clone)]
pub struct CaptureSource {
    pub log_path: PathBuf,
    /// Timestamp suffix of the capture directory, when the log lives in one.
    pub timestamp_tag: Option<String>,
    /// Sibling device-log directory correlated by the shared timestamp tag.
    pub device_log_dir: Option<PathBuf>,
}

/// Read a log file as lossy UTF-8 and resolve its capture layout.
pub fn load(log_path: &Path) -> Result<(String, CaptureSource), TriageError> {
    let bytes = fs::read(log_path).map_err(|source| TriageError::LogRead {
        path: log_path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let source = resolve_layout(log_path);
    if let Some(dir) = &source.device_log_dir {
        debug!(device_logs = %dir.display(), "found sibling device-log directory");
    }
    Ok((text, source))
}

/// When the log sits in `monkey_logs_<tag>/`, look for the sibling
/// `logcat_logs_<tag>/` directory next to it.
fn resolve_layout(log_path: &Path) -> CaptureSource {
    let mut source = CaptureSource {
        log_path: log_path.to_path_buf(),
        timestamp_tag: None,
        device_log_dir: None,
    };

    let Some(parent) = log_path.parent() else {
        return source;
    };
    let Some(dir_name) = parent.file_name().and_then(|n| n.to_str()) else {
        return source;
    };
    let Some(tag) = dir_name.strip_prefix(CAPTURE_DIR_PREFIX) else {
        return source;
    };

    source.timestamp_tag = Some(tag.to_string());
    let sibling = parent
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}{}", DEVICE_LOG_DIR_PREFIX, tag));
    if sibling.is_dir() {
        source.device_log_dir = Some(sibling);
    }
    source
}

/// Scan a directory for `monkey_logs_*` capture folders containing a `.log`
/// file, sorted by timestamp tag. Unreadable entries are skipped.
pub fn find_capture_dirs(base: &Path) -> Vec<(PathBuf, String)> {
    let mut captures = Vec::new();

    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %base.display(), error = %err, "cannot scan for capture directories");
            return captures;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(tag) = name.strip_prefix(CAPTURE_DIR_PREFIX) else {
            continue;
        };
        if let Some(log_file) = first_log_file(&path) {
            captures.push((log_file, tag.to_string()));
        }
    }

    captures.sort_by(|a, b| a.1.cmp(&b.1));
    captures
}

fn first_log_file(dir: &Path) -> Option<PathBuf> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("log"))
        .collect();
    logs.sort();
    logs.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_device_log_dir_is_correlated_by_tag() {
        let base = tempfile::tempdir().unwrap();
        let capture = base.path().join("monkey_logs_20251129100000");
        let device = base.path().join("logcat_logs_20251129100000");
        fs::create_dir(&capture).unwrap();
        fs::create_dir(&device).unwrap();
        let log = capture.join("monkey_log_20251129100000.log");
        fs::write(&log, "// CRASH: com.example.app (pid 1)\n").unwrap();

        let (text, source) = load(&log).unwrap();
        assert!(text.contains("CRASH"));
        assert_eq!(source.timestamp_tag.as_deref(), Some("20251129100000"));
        assert_eq!(source.device_log_dir.as_deref(), Some(device.as_path()));
    }

    #[test]
    fn missing_sibling_dir_is_not_an_error() {
        let base = tempfile::tempdir().unwrap();
        let capture = base.path().join("monkey_logs_20251129100000");
        fs::create_dir(&capture).unwrap();
        let log = capture.join("run.log");
        fs::write(&log, "content").unwrap();

        let (_, source) = load(&log).unwrap();
        assert!(source.device_log_dir.is_none());
    }

    #[test]
    fn loose_log_file_has_no_capture_layout() {
        let base = tempfile::tempdir().unwrap();
        let log = base.path().join("plain.log");
        fs::write(&log, "content").unwrap();

        let (_, source) = load(&log).unwrap();
        assert!(source.timestamp_tag.is_none());
        assert!(source.device_log_dir.is_none());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let base = tempfile::tempdir().unwrap();
        let log = base.path().join("run.log");
        fs::write(&log, [0x2f, 0x2f, 0x20, 0xff, 0xfe, 0x0a]).unwrap();
        let (text, _) = load(&log).unwrap();
        assert!(text.starts_with("// "));
    }

    #[test]
    fn batch_scan_finds_captures_sorted_by_tag() {
        let base = tempfile::tempdir().unwrap();
        for tag in ["20251129110000", "20251129100000"] {
            let dir = base.path().join(format!("monkey_logs_{}", tag));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("run.log"), "x").unwrap();
        }
        // folders without a .log file are skipped
        fs::create_dir(base.path().join("monkey_logs_20251129120000")).unwrap();
        // unrelated folders are ignored
        fs::create_dir(base.path().join("reports")).unwrap();

        let captures = find_capture_dirs(base.path());
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0].1, "20251129100000");
        assert_eq!(captures[1].1, "20251129110000");
    }

    #[test]
    fn missing_log_file_surfaces_as_log_read_error() {
        let err = load(Path::new("/nonexistent/run.log")).unwrap_err();
        assert!(matches!(err, TriageError::LogRead { .. }));
    }
}
