//! History change events pushed to WebSocket clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event emitted after every successful history mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    /// A batch of runs was merged into history.
    RunsIngested(RunsIngestedPayload),
    /// A poll cycle replaced history with the source's current contents.
    HistoryRefreshed(HistoryRefreshedPayload),
    /// The selection cursor moved.
    SelectionChanged(SelectionChangedPayload),
    /// History was emptied.
    HistoryCleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunsIngestedPayload {
    pub batch_id: Uuid,
    pub accepted: usize,
    pub total_runs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRefreshedPayload {
    pub cycle: u64,
    pub total_runs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionChangedPayload {
    pub run_id: String,
}

/// Wrapper that includes timestamp with every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEventMessage {
    #[serde(flatten)]
    pub event: HistoryEvent,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEventMessage {
    /// Create a new event message with the current timestamp.
    pub fn new(event: HistoryEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}
