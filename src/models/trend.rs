//! Trend series models derived from run history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One run's run-level scalar summary, aligned with history order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    pub run_number: u64,
    pub timestamp: DateTime<Utc>,
    pub total_tests: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
    /// Percentage in `[0, 100]`; 0 when the run has no tests
    pub success_rate: f64,
    /// Seconds
    pub total_time: f64,
    pub file_name: String,
}

/// Net drift between the first and last trend points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendDelta {
    pub success_rate_change: f64,
    pub time_change: f64,
    pub test_count_change: i64,
    pub runs_analyzed: usize,
}

/// One suite's metrics in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuiteTrendPoint {
    pub run_number: u64,
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    pub success_rate: f64,
    pub total_time: f64,
    pub test_count: u64,
    /// False when the run has no suite of this name; metrics are zeroed then
    pub exists: bool,
}

/// One suite name aligned across every run in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuiteTrend {
    pub suite_name: String,
    pub data: Vec<SuiteTrendPoint>,
}

impl SuiteTrend {
    /// Points for runs that actually contain the suite.
    pub fn present_points(&self) -> impl Iterator<Item = &SuiteTrendPoint> {
        self.data.iter().filter(|p| p.exists)
    }

    pub fn runs_present(&self) -> usize {
        self.present_points().count()
    }
}

/// Summary of a single run, as shown for the selected run.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RunSummary {
    pub id: String,
    pub run_number: u64,
    pub file_name: String,
    pub sha: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    pub total_count: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
    pub success_rate: f64,
    pub suite_count: usize,
    /// Suites with at least one failed or errored test
    pub failing_suites: Vec<String>,
    /// Failed or errored cases listed across all suites
    pub failed_case_count: usize,
    pub total_time: f64,
    /// Human-readable duration, e.g. `2m 5.0s`
    pub total_time_display: String,
}
