//! Run history: the ordered run collection plus the selection cursor.
//!
//! [`RunHistory`] holds the state and its invariants; [`RunHistoryStore`] is
//! the shared handle the rest of the server uses. Every store mutation runs
//! inside one write-lock critical section, so concurrent batches never
//! interleave their read-modify-write of `runs` and `selected_run_id`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BatchError, NotFoundError};
use crate::models::{
    HistoryEvent, HistoryRefreshedPayload, Run, RunOrigin, RunsIngestedPayload,
    SelectionChangedPayload,
};
use crate::services::EventBroadcaster;

/// Ordered run collection with a single selected run.
///
/// Invariants: `runs` is sorted by `run_number` ascending with ties in
/// ingestion order, and `selected_run_id`, when set, names a run in `runs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunHistory {
    runs: Vec<Run>,
    selected_run_id: Option<String>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn selected_run_id(&self) -> Option<&str> {
        self.selected_run_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == id)
    }

    /// The run under the selection cursor.
    pub fn selected(&self) -> Option<&Run> {
        self.selected_run_id.as_deref().and_then(|id| self.get(id))
    }

    /// Merge resolved runs into history.
    ///
    /// Appends, then stable-sorts everything by run number. The latest run is
    /// selected only when nothing is selected yet. Returns the number merged.
    pub fn ingest_batch(&mut self, runs: Vec<Run>) -> Result<usize, BatchError> {
        if runs.is_empty() {
            return Err(BatchError::EmptyBatch { skipped: 0 });
        }

        let accepted = runs.len();
        self.runs.extend(runs);
        self.runs.sort_by_key(|r| r.run_number);

        if self.selected_run_id.is_none() {
            self.selected_run_id = self.runs.last().map(|r| r.id.clone());
        }

        Ok(accepted)
    }

    /// Move the cursor to `id`. Unknown ids leave the cursor untouched.
    pub fn select(&mut self, id: &str) -> Result<(), NotFoundError> {
        if self.get(id).is_none() {
            return Err(NotFoundError { id: id.to_string() });
        }
        self.selected_run_id = Some(id.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        self.selected_run_id = None;
    }

    /// Run number one past the highest in history, or 0 when empty.
    ///
    /// Used as the fallback ordinal base so runs without a number in their
    /// name land after everything already loaded.
    pub fn next_ordinal(&self) -> u64 {
        self.runs
            .iter()
            .map(|r| r.run_number)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Reconcile source-owned runs with a fresh listing of the source.
    ///
    /// Uploaded runs are never touched. A source run whose file is listed
    /// again with identical results is kept as is, id and timestamp included;
    /// changed or new files enter as new runs and files no longer listed drop
    /// out. The selection stays put when its run survives, otherwise it
    /// follows the file name, otherwise it moves to the latest run.
    pub fn sync_source(&mut self, incoming: Vec<Run>) -> Result<SourceSync, BatchError> {
        if incoming.is_empty() {
            return Err(BatchError::EmptyBatch { skipped: 0 });
        }

        let selected_file = self.selected().map(|r| r.file_name.clone());
        let mut fresh: Vec<Option<Run>> = incoming
            .into_iter()
            .map(|mut run| {
                run.origin = RunOrigin::Source;
                Some(run)
            })
            .collect();

        let mut runs = Vec::with_capacity(self.runs.len() + fresh.len());
        let mut removed = 0;
        for run in self.runs.drain(..) {
            if run.origin == RunOrigin::Upload {
                runs.push(run);
                continue;
            }
            let unchanged = fresh.iter_mut().find(|slot| {
                slot.as_ref()
                    .is_some_and(|f| f.file_name == run.file_name && f.results == run.results)
            });
            match unchanged {
                Some(slot) => {
                    *slot = None;
                    runs.push(run);
                }
                None => removed += 1,
            }
        }

        let added = fresh.iter().flatten().count();
        runs.extend(fresh.into_iter().flatten());
        runs.sort_by_key(|r| r.run_number);
        self.runs = runs;

        if self.selected().is_none() {
            let carried = selected_file
                .and_then(|name| self.runs.iter().rev().find(|r| r.file_name == name))
                .map(|r| r.id.clone());
            self.selected_run_id = carried.or_else(|| self.runs.last().map(|r| r.id.clone()));
        }

        Ok(SourceSync {
            added,
            removed,
            total_runs: self.runs.len(),
        })
    }
}

/// Changes made by [`RunHistory::sync_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSync {
    pub added: usize,
    pub removed: usize,
    pub total_runs: usize,
}

/// Result of applying one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleApply {
    /// The cycle's runs replaced history.
    Applied { total_runs: usize },
    /// A newer cycle was already applied; this result was discarded.
    Stale { latest_cycle: u64 },
}

#[derive(Debug, Default)]
struct StoreState {
    history: RunHistory,
    /// Highest poll cycle whose result has been applied
    last_cycle: Option<u64>,
}

/// Shared handle to the session's single run history.
#[derive(Clone, Debug)]
pub struct RunHistoryStore {
    state: Arc<RwLock<StoreState>>,
    events: EventBroadcaster,
}

impl RunHistoryStore {
    pub fn new(events: EventBroadcaster) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            events,
        }
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point-in-time copy of the history.
    pub fn snapshot(&self) -> RunHistory {
        self.read().history.clone()
    }

    /// Run `f` against the current runs without copying them.
    pub fn with_runs<R>(&self, f: impl FnOnce(&[Run]) -> R) -> R {
        f(self.read().history.runs())
    }

    pub fn len(&self) -> usize {
        self.read().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().history.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Run> {
        self.read().history.get(id).cloned()
    }

    pub fn selected(&self) -> Option<Run> {
        self.read().history.selected().cloned()
    }

    pub fn selected_run_id(&self) -> Option<String> {
        self.read().history.selected_run_id().map(String::from)
    }

    pub fn next_ordinal(&self) -> u64 {
        self.read().history.next_ordinal()
    }

    /// Merge a batch of resolved runs. See [`RunHistory::ingest_batch`].
    ///
    /// Returns the history length right after the merge.
    pub fn ingest_batch(&self, batch_id: Uuid, runs: Vec<Run>) -> Result<usize, BatchError> {
        let mut state = self.write();
        let accepted = state.history.ingest_batch(runs)?;
        let total_runs = state.history.len();
        let selected_run_id = state.history.selected_run_id().map(String::from);

        info!(
            batch_id = %batch_id,
            accepted,
            total_runs,
            "Runs ingested into history"
        );

        self.events
            .send(HistoryEvent::RunsIngested(RunsIngestedPayload {
                batch_id,
                accepted,
                total_runs,
                selected_run_id,
            }));

        Ok(total_runs)
    }

    pub fn select(&self, id: &str) -> Result<(), NotFoundError> {
        let mut state = self.write();
        state.history.select(id)?;
        debug!(run_id = %id, "Selected run");

        self.events
            .send(HistoryEvent::SelectionChanged(SelectionChangedPayload {
                run_id: id.to_string(),
            }));
        Ok(())
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.history.clear();
        info!("History cleared");
        self.events.send(HistoryEvent::HistoryCleared);
    }

    /// Apply the result of poll cycle `cycle`, numbered by start order.
    ///
    /// See [`RunHistory::sync_source`] for how the listing is merged. A result from a cycle older than the last applied one is discarded, so
    /// a slow cycle can never overwrite a newer one. A failed cycle does not
    /// advance the watermark.
    pub fn apply_cycle(&self, cycle: u64, runs: Vec<Run>) -> Result<CycleApply, BatchError> {
        let mut state = self.write();

        if let Some(latest_cycle) = state.last_cycle
            && cycle <= latest_cycle
        {
            debug!(cycle, latest_cycle, "Discarding stale poll cycle");
            return Ok(CycleApply::Stale { latest_cycle });
        }

        let SourceSync {
            added,
            removed,
            total_runs,
        } = state.history.sync_source(runs)?;
        state.last_cycle = Some(cycle);
        let selected_run_id = state.history.selected_run_id().map(String::from);

        debug!(cycle, added, removed, total_runs, "Synced source runs");

        if added > 0 || removed > 0 {
            self.events
                .send(HistoryEvent::HistoryRefreshed(HistoryRefreshedPayload {
                    cycle,
                    total_runs,
                    selected_run_id,
                }));
        }

        Ok(CycleApply::Applied { total_runs })
    }
}

impl Default for RunHistoryStore {
    fn default() -> Self {
        Self::new(EventBroadcaster::new())
    }
}
