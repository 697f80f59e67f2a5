//! Stress-test log triage engine.
//!
//! Turns raw stress-test logs (crash dumps, not-responding reports,
//! exception traces) into a ranked, deduplicated, root-cause-annotated
//! error catalogue.
//!
//! ## Architecture
//!
//! ```text
//!  ┌───────────┐   ┌────────┐   ┌───────┐   ┌────────┐   ┌────────────┐   ┌───────┐
//!  │ Extractor │──▶│ Noise  │──▶│ Dedup │──▶│ Scorer │──▶│ Root cause │──▶│ Chain │
//!  │ (markers) │   │ filter │   │       │   │        │   │  analyzer  │   │ corr. │
//!  └───────────┘   └────────┘   └───────┘   └────────┘   └────────────┘   └───────┘
//! ```
//!
//! Each run is an independent, synchronous batch transform: one log text in,
//! one annotated catalogue out. Runs share no mutable state, so separate log
//! files may be analyzed in parallel.
//!
//! ## Usage
//!
//! ```ignore
//! use triage_engine::pipeline::Analyzer;
//!
//! let report = Analyzer::default().analyze(&log_text);
//! for entry in &report.errors {
//!     println!("{} {}", entry.record.process_name, entry.occurrences());
//! }
//! ```

pub mod capture;
pub mod chain;
pub mod dedup;
pub mod environment;
pub mod extractor;
pub mod noise;
pub mod pipeline;
pub mod report;
pub mod root_cause;
pub mod severity;
pub mod summary;

pub use pipeline::{AnalysisReport, Analyzer, AnalyzerOptions};
pub use report::ReportWriter;
