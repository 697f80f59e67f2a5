pub mod dedup;
pub mod error;
pub mod record;
pub mod root_cause;
pub mod severity;
pub mod timestamp;

pub use dedup::Deduplication;
pub use error::TriageError;
pub use record::{AnalyzedError, ErrorCategory, ErrorRecord};
pub use root_cause::{FailurePattern, Ownership, PrimaryLocation, RootCause, StackFrame};
pub use severity::{Priority, SeverityDetails, SeverityScore};
