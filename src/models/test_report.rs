//! Test report wire models.
//!
//! These mirror the JSON document a CI run produces. They are only ever
//! constructed through [`crate::services::validator`], which guarantees the
//! required fields are present and the numeric fields are well-formed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Test case execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Failed,
    Error,
    Skipped,
}

impl TestStatus {
    /// Failed and errored cases are both reported as failures.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

/// One executed test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestCase {
    pub status: TestStatus,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub classname: String,
    #[serde(default)]
    pub file: Option<String>,
    /// Execution time in seconds
    #[serde(default)]
    pub execution_time: f64,
    #[serde(default)]
    pub system_output: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

/// Named group of test cases from one framework invocation.
///
/// The four outcome counts are expected to add up to `total_count`, but the
/// report is produced externally and nothing downstream relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestSuite {
    pub name: String,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default)]
    pub skipped_count: u64,
    #[serde(default)]
    pub error_count: u64,
    /// Free-form error attached to the whole suite (string or structured)
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub suite_error: Option<serde_json::Value>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn success_rate(&self) -> f64 {
        success_rate(self.success_count, self.total_count)
    }

    /// True when any case failed or errored.
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0 || self.error_count > 0
    }

    /// Number of listed cases that failed or errored.
    pub fn failed_case_count(&self) -> usize {
        self.test_cases
            .iter()
            .filter(|c| c.status.is_failure())
            .count()
    }
}

/// One CI run's full result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestReport {
    pub sha: String,
    /// Creation time as written by the producer (normally RFC 3339)
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub total_time: f64,
    pub total_count: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default)]
    pub skipped_count: u64,
    #[serde(default)]
    pub error_count: u64,
    pub test_suites: Vec<TestSuite>,
}

impl TestReport {
    /// Parsed `created_at`, if it is a valid RFC 3339 timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn success_rate(&self) -> f64 {
        success_rate(self.success_count, self.total_count)
    }

    /// Suite with exactly this name (case-sensitive).
    pub fn suite(&self, name: &str) -> Option<&TestSuite> {
        self.test_suites.iter().find(|s| s.name == name)
    }

    /// Names of suites with at least one failed or errored test.
    pub fn failing_suites(&self) -> Vec<&str> {
        self.test_suites
            .iter()
            .filter(|s| s.has_failures())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// First 8 characters of the commit sha.
    pub fn short_sha(&self) -> &str {
        match self.sha.char_indices().nth(8) {
            Some((idx, _)) => &self.sha[..idx],
            None => &self.sha,
        }
    }
}

/// Percentage of successful tests, defined as 0 when there are no tests.
pub fn success_rate(success: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (success as f64 * 100.0) / total as f64
}
