//! `triage` entry point.
//!
//! Single-file mode analyzes one stress-test log; with no file argument it
//! batch-processes every `monkey_logs_*` capture folder in the working
//! directory. One capture's failure never aborts the rest of a batch.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use triage_core::TriageError;
use triage_engine::pipeline::{Analyzer, AnalyzerOptions};
use triage_engine::{capture, summary, ReportWriter};

#[derive(Parser, Debug)]
#[command(
    name = "triage",
    version,
    about = "Analyze stress-test logs into a ranked, deduplicated error catalogue"
)]
struct Cli {
    /// Stress-test log file; omit to batch-process monkey_logs_* folders in
    /// the working directory
    log_file: Option<PathBuf>,

    /// Directory to write reports under (defaults to the working directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep every record instead of collapsing causal chains to their roots
    #[arg(short, long)]
    all: bool,

    /// Write the full report document (dedup, severity, root-cause detail)
    /// instead of one basic JSON per error
    #[arg(short, long)]
    full: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let output_base = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let options = AnalyzerOptions {
        enable_correlation: !cli.all,
    };

    match &cli.log_file {
        Some(log_file) => match run_one(log_file, &output_base, options, cli.full, None) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = %err, "analysis failed");
                ExitCode::FAILURE
            }
        },
        None => run_batch(&output_base, options, cli.full),
    }
}

/// Analyze one log file and write its report directory.
fn run_one(
    log_file: &Path,
    output_base: &Path,
    options: AnalyzerOptions,
    full: bool,
    tag_override: Option<String>,
) -> Result<(), TriageError> {
    let (text, source) = capture::load(log_file)?;
    if let Some(dir) = &source.device_log_dir {
        info!(device_logs = %dir.display(), "capture has sibling device logs");
    }

    let report = Analyzer::new(options).analyze(&text);
    info!(
        log = %log_file.display(),
        errors = report.errors.len(),
        "analysis complete"
    );

    let writer = ReportWriter::new(output_base, tag_override.or(source.timestamp_tag));
    if report.errors.is_empty() {
        info!("no errors found; writing summary only");
    }
    if full {
        writer.write_full(&report)?;
    } else {
        writer.write_simple(&report)?;
        let summary_text = summary::executive_summary(&report.errors, &report.environment);
        println!("{}", summary_text);
    }
    info!(report_dir = %writer.report_dir().display(), "report written");
    Ok(())
}

/// Process every capture folder under the working directory; failures are
/// counted per capture and never stop the batch.
fn run_batch(output_base: &Path, options: AnalyzerOptions, full: bool) -> ExitCode {
    let captures = capture::find_capture_dirs(Path::new("."));
    if captures.is_empty() {
        warn!("no monkey_logs_* capture folders found in the working directory");
        return ExitCode::SUCCESS;
    }

    info!(captures = captures.len(), "batch processing capture folders");
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for (log_file, tag) in captures {
        match run_one(&log_file, output_base, options, full, Some(tag.clone())) {
            Ok(()) => succeeded += 1,
            Err(err) => {
                failed += 1;
                warn!(capture = %tag, error = %err, "capture analysis failed; continuing");
            }
        }
    }

    info!(succeeded, failed, "batch complete");
    if failed > 0 && succeeded == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
