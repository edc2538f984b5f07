//! Business logic services.

pub mod event_broadcaster;
pub mod history;
pub mod identity;
pub mod ingest;
pub mod poller;
pub mod source;
pub mod suites;
pub mod trends;
pub mod validator;

pub use event_broadcaster::EventBroadcaster;
pub use history::{CycleApply, RunHistory, RunHistoryStore, SourceSync};
pub use identity::{ExplicitOrdinal, FirstDigitRun, RunIdentityResolver, RunNumberStrategy};
pub use ingest::{IngestReport, IngestWarning, RawPayload, WarningReason, ingest_payloads};
pub use poller::{CycleReport, Poller};
pub use source::{DirectorySource, HttpSource, ReportSource, SourceEntry};
pub use suites::correlate_suites;
pub use trends::{compute_trends, format_duration, summarize_run, trend_delta};
