//! Poll cycles: periodically reload history from a report source.
//!
//! Each cycle is numbered when it starts. The store applies a cycle's result
//! only if no later-started cycle has been applied already, so overlapping
//! cycles resolve last-write-wins by start order regardless of which one
//! finishes first.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult, BatchError};
use crate::services::history::{CycleApply, RunHistoryStore};
use crate::services::identity::RunIdentityResolver;
use crate::services::ingest::{IngestWarning, RawPayload, prepare_batch_parallel};
use crate::services::source::ReportSource;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CycleReport {
    pub cycle: u64,
    /// False when a newer cycle had already been applied
    pub applied: bool,
    pub total_runs: usize,
    pub warnings: Vec<IngestWarning>,
}

/// Reloads history from a [`ReportSource`].
#[derive(Clone)]
pub struct Poller {
    source: Arc<dyn ReportSource>,
    store: RunHistoryStore,
    resolver: RunIdentityResolver,
    next_cycle: Arc<AtomicU64>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn ReportSource>,
        store: RunHistoryStore,
        resolver: RunIdentityResolver,
    ) -> Self {
        Self {
            source,
            store,
            resolver,
            next_cycle: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    /// Reserve the next cycle number.
    fn begin_cycle(&self) -> u64 {
        self.next_cycle.fetch_add(1, Ordering::SeqCst)
    }

    /// Run one full cycle: list, fetch, validate, apply.
    pub async fn run_cycle(&self) -> AppResult<CycleReport> {
        let cycle = self.begin_cycle();
        let (payloads, mut warnings) = self.load().await?;

        let batch = prepare_batch_parallel(payloads, &self.resolver, 0).await;
        warnings.extend(batch.warnings);

        if batch.runs.is_empty() {
            warn!(
                cycle,
                source = %self.source.describe(),
                "Poll cycle found no valid report files"
            );
            return Err(BatchError::EmptyBatch {
                skipped: warnings.len() + batch.ignored,
            }
            .into());
        }

        let (applied, total_runs) = match self.store.apply_cycle(cycle, batch.runs)? {
            CycleApply::Applied { total_runs } => (true, total_runs),
            CycleApply::Stale { latest_cycle } => {
                info!(cycle, latest_cycle, "Poll cycle superseded by a newer one");
                (false, self.store.len())
            }
        };

        if applied {
            info!(
                cycle,
                total_runs,
                warnings = warnings.len(),
                "Poll cycle applied"
            );
        }

        Ok(CycleReport {
            cycle,
            applied,
            total_runs,
            warnings,
        })
    }

    /// Fetch every listed file concurrently; fetch failures become warnings.
    async fn load(&self) -> AppResult<(Vec<RawPayload>, Vec<IngestWarning>)> {
        let entries = self.source.list().await.map_err(AppError::from)?;
        let fetches = entries.iter().map(|entry| self.source.fetch(entry));
        let results = join_all(fetches).await;

        let mut payloads = Vec::with_capacity(entries.len());
        let mut warnings = Vec::new();
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(payload) => payloads.push(payload),
                Err(e) => {
                    warn!(file = %entry.file_name, "Failed to fetch report: {}", e);
                    warnings.push(IngestWarning::fetch_failed(&entry.file_name, e.to_string()));
                }
            }
        }
        Ok((payloads, warnings))
    }

    /// Spawn the polling loop. The first cycle runs immediately.
    pub fn start(self, interval_secs: u64) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Starting report poller (source: {}, interval: {} seconds)",
                self.source.describe(),
                interval_secs
            );

            let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if let Err(e) = self.run_cycle().await {
                    error!("Poll cycle error: {}", e);
                }
            }
        })
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.source.describe())
            .field("next_cycle", &self.next_cycle.load(Ordering::Relaxed))
            .finish()
    }
}
