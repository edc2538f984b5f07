//! Run identity resolution.
//!
//! Assigns each validated report a run number (the history ordering key) and
//! a process-unique id. Run numbers come from a pluggable
//! [`RunNumberStrategy`]; the default takes the first run of decimal digits in
//! the file name. That heuristic misorders names whose meaningful counter is
//! not the first number (`build7_run12.json` sorts as 7), which is accepted:
//! callers with explicit sequence metadata should supply their own strategy.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::models::{Run, RunOrigin, TestReport};

/// Per-process sequence appended to every id so that two runs resolved in the
/// same millisecond with the same name and ordinal still differ.
static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Strategy deriving a run number from a file name.
pub trait RunNumberStrategy: Send + Sync {
    fn run_number(&self, file_name: &str, fallback_ordinal: u64) -> u64;
}

/// First contiguous run of ASCII digits in the file name, else the ordinal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDigitRun;

impl RunNumberStrategy for FirstDigitRun {
    fn run_number(&self, file_name: &str, fallback_ordinal: u64) -> u64 {
        first_digit_run(file_name)
            .and_then(|digits| digits.parse::<u64>().ok())
            .unwrap_or(fallback_ordinal)
    }
}

/// Ignores the file name entirely; runs keep their arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitOrdinal;

impl RunNumberStrategy for ExplicitOrdinal {
    fn run_number(&self, _file_name: &str, fallback_ordinal: u64) -> u64 {
        fallback_ordinal
    }
}

fn first_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// Builds [`Run`]s from validated reports.
#[derive(Clone)]
pub struct RunIdentityResolver {
    strategy: Arc<dyn RunNumberStrategy>,
}

impl RunIdentityResolver {
    pub fn new(strategy: Arc<dyn RunNumberStrategy>) -> Self {
        Self { strategy }
    }

    /// Resolve identity for one report.
    ///
    /// The timestamp prefers the report's own `created_at`, then the file's
    /// modification time, then the current wall clock.
    pub fn resolve(
        &self,
        file_name: &str,
        fallback_ordinal: u64,
        fallback_timestamp: Option<DateTime<Utc>>,
        report: TestReport,
    ) -> Run {
        let now = Utc::now();
        let run_number = self.strategy.run_number(file_name, fallback_ordinal);
        let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let id = format!(
            "{}-{}-{}-{}",
            file_name,
            now.timestamp_millis(),
            fallback_ordinal,
            seq
        );
        let timestamp = report
            .created_at_utc()
            .or(fallback_timestamp)
            .unwrap_or(now);

        Run {
            id,
            run_number,
            file_name: file_name.to_string(),
            timestamp,
            origin: RunOrigin::Upload,
            results: report,
        }
    }
}

impl Default for RunIdentityResolver {
    fn default() -> Self {
        Self::new(Arc::new(FirstDigitRun))
    }
}

impl std::fmt::Debug for RunIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunIdentityResolver").finish_non_exhaustive()
    }
}
