//! Run model: an identity-resolved, time-ordered wrapper around one report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TestReport;

/// How a run entered history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunOrigin {
    /// Uploaded through the API; only `clear` removes it
    #[default]
    Upload,
    /// Loaded by a poll cycle; owned by the report source
    Source,
}

/// One ingested CI run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Run {
    /// Process-unique identifier
    pub id: String,
    /// Ordering key; not guaranteed unique or gap-free
    pub run_number: u64,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub origin: RunOrigin,
    pub results: TestReport,
}

/// Lightweight run entry for history listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunListItem {
    pub id: String,
    pub run_number: u64,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub origin: RunOrigin,
    pub sha: String,
    pub total_count: u64,
    pub success_rate: f64,
    pub suite_count: usize,
}

impl From<&Run> for RunListItem {
    fn from(run: &Run) -> Self {
        RunListItem {
            id: run.id.clone(),
            run_number: run.run_number,
            file_name: run.file_name.clone(),
            timestamp: run.timestamp,
            origin: run.origin,
            sha: run.results.short_sha().to_string(),
            total_count: run.results.total_count,
            success_rate: run.results.success_rate(),
            suite_count: run.results.test_suites.len(),
        }
    }
}

/// History listing response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub runs: Vec<RunListItem>,
    pub selected_run_id: Option<String>,
}
