//! Batch ingestion: raw payloads -> validated, identity-resolved runs.
//!
//! Each payload is validated independently and a failure only skips that
//! file. The batch is a fold into `(runs, warnings)` that never short-circuits;
//! it is rejected as a whole only when no run survives.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{BatchError, ParseError, ParseErrorKind};
use crate::models::{Run, TestReport};
use crate::services::history::RunHistoryStore;
use crate::services::identity::RunIdentityResolver;
use crate::services::validator;

/// One file as handed over by an upload or a report source.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl RawPayload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// Why a file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    Malformed,
    SchemaMismatch,
    /// The source could not deliver the file
    FetchFailed,
}

impl From<ParseErrorKind> for WarningReason {
    fn from(kind: ParseErrorKind) -> Self {
        match kind {
            ParseErrorKind::Malformed => Self::Malformed,
            ParseErrorKind::SchemaMismatch => Self::SchemaMismatch,
        }
    }
}

/// A file skipped during batch ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IngestWarning {
    pub file_name: String,
    pub reason: WarningReason,
    pub message: String,
}

impl IngestWarning {
    pub fn from_parse_error(file_name: &str, err: ParseError) -> Self {
        Self {
            file_name: file_name.to_string(),
            reason: err.kind.into(),
            message: err.message,
        }
    }

    pub fn fetch_failed(file_name: &str, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.to_string(),
            reason: WarningReason::FetchFailed,
            message: message.into(),
        }
    }
}

/// Runs that survived validation plus the warnings for those that did not.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub runs: Vec<Run>,
    pub warnings: Vec<IngestWarning>,
    /// Files ignored because they are not `.json`
    pub ignored: usize,
}

impl PreparedBatch {
    fn push(
        &mut self,
        resolver: &RunIdentityResolver,
        payload: &RawPayload,
        ordinal: u64,
        result: Result<TestReport, ParseError>,
    ) {
        match result {
            Ok(report) => self.runs.push(resolver.resolve(
                &payload.file_name,
                ordinal,
                payload.last_modified,
                report,
            )),
            Err(err) => {
                warn!(
                    file = %payload.file_name,
                    kind = %err.kind,
                    "Failed to parse test report: {}",
                    err.message
                );
                self.warnings
                    .push(IngestWarning::from_parse_error(&payload.file_name, err));
            }
        }
    }
}

/// Validate and resolve a batch, one blocking-pool task per file.
///
/// Results are folded back in input order, so the batch is the same as a
/// sequential pass would produce. `ordinal_base` offsets the fallback
/// ordinal so name-less runs sort after what is already in history.
pub async fn prepare_batch_parallel(
    payloads: Vec<RawPayload>,
    resolver: &RunIdentityResolver,
    ordinal_base: u64,
) -> PreparedBatch {
    let tasks = payloads.iter().map(|payload| {
        let is_report = validator::is_report_file(&payload.file_name);
        let content = payload.content.clone();
        async move {
            if !is_report {
                return None;
            }
            let result = tokio::task::spawn_blocking(move || validator::validate_bytes(&content))
                .await
                .unwrap_or_else(|e| {
                    Err(ParseError::malformed(format!("Validation task failed: {}", e)))
                });
            Some(result)
        }
    });
    let results = join_all(tasks).await;

    let mut batch = PreparedBatch::default();
    for (idx, (payload, result)) in payloads.iter().zip(results).enumerate() {
        match result {
            Some(result) => batch.push(resolver, payload, ordinal_base + idx as u64, result),
            None => batch.ignored += 1,
        }
    }
    batch
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestReport {
    pub batch_id: Uuid,
    /// Ids of the runs added, in input order
    pub accepted: Vec<String>,
    pub warnings: Vec<IngestWarning>,
    pub ignored: usize,
    pub total_runs: usize,
}

/// Validate, resolve and merge a batch into the store.
///
/// Fails with `EmptyBatch` (store unchanged) when no file produced a run.
pub async fn ingest_payloads(
    store: &RunHistoryStore,
    resolver: &RunIdentityResolver,
    payloads: Vec<RawPayload>,
) -> Result<IngestReport, BatchError> {
    let batch_id = Uuid::now_v7();
    let file_count = payloads.len();
    let batch = prepare_batch_parallel(payloads, resolver, store.next_ordinal()).await;

    info!(
        batch_id = %batch_id,
        files = file_count,
        valid = batch.runs.len(),
        warnings = batch.warnings.len(),
        ignored = batch.ignored,
        "Batch validated"
    );

    if batch.runs.is_empty() {
        return Err(BatchError::EmptyBatch {
            skipped: batch.warnings.len() + batch.ignored,
        });
    }

    let accepted: Vec<String> = batch.runs.iter().map(|r| r.id.clone()).collect();
    let total_runs = store.ingest_batch(batch_id, batch.runs)?;

    Ok(IngestReport {
        batch_id,
        accepted,
        warnings: batch.warnings,
        ignored: batch.ignored,
        total_runs,
    })
}
