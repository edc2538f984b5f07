//! Per-suite correlation across runs.
//!
//! Suites are matched by exact, case-sensitive name. A renamed suite shows up
//! as two unrelated suites, each absent from the other's runs.

use std::collections::HashSet;

use crate::models::{Run, SuiteTrend, SuiteTrendPoint, TestSuite};

/// One [`SuiteTrend`] per distinct suite name, in first-observed order.
///
/// Every trend carries exactly one point per run in history order; runs
/// without the suite get `exists: false` and zeroed metrics.
pub fn correlate_suites(runs: &[Run]) -> Vec<SuiteTrend> {
    suite_names(runs)
        .into_iter()
        .map(|name| SuiteTrend {
            suite_name: name.to_string(),
            data: runs.iter().map(|run| suite_point(run, name)).collect(),
        })
        .collect()
}

/// Distinct suite names, walking runs in order and suites in report order.
pub fn suite_names(runs: &[Run]) -> Vec<&str> {
    let mut seen = HashSet::new();
    runs.iter()
        .flat_map(|run| run.results.test_suites.iter())
        .map(|suite| suite.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

fn suite_point(run: &Run, name: &str) -> SuiteTrendPoint {
    let suite = run.results.suite(name);
    SuiteTrendPoint {
        run_number: run.run_number,
        timestamp: run.timestamp,
        file_name: run.file_name.clone(),
        success_rate: suite.map(TestSuite::success_rate).unwrap_or(0.0),
        total_time: suite.map(|s| s.total_time).unwrap_or(0.0),
        test_count: suite.map(|s| s.total_count).unwrap_or(0),
        exists: suite.is_some(),
    }
}
