//! Run-level trend aggregation.

use crate::models::{Run, RunSummary, TrendDelta, TrendPoint};

/// One trend point per run, in history order.
pub fn compute_trends(runs: &[Run]) -> Vec<TrendPoint> {
    runs.iter().map(trend_point).collect()
}

fn trend_point(run: &Run) -> TrendPoint {
    let report = &run.results;
    TrendPoint {
        run_number: run.run_number,
        timestamp: run.timestamp,
        total_tests: report.total_count,
        success_count: report.success_count,
        failed_count: report.failed_count,
        error_count: report.error_count,
        skipped_count: report.skipped_count,
        success_rate: report.success_rate(),
        total_time: report.total_time,
        file_name: run.file_name.clone(),
    }
}

/// Net change from the first to the last point.
///
/// This is drift across the whole window, not the latest step. `None` with
/// fewer than two points.
pub fn trend_delta(points: &[TrendPoint]) -> Option<TrendDelta> {
    let [first, .., last] = points else {
        return None;
    };

    Some(TrendDelta {
        success_rate_change: last.success_rate - first.success_rate,
        time_change: last.total_time - first.total_time,
        test_count_change: count_change(first.total_tests, last.total_tests),
        runs_analyzed: points.len(),
    })
}

/// Signed `to - from`, clamped to the `i64` range.
fn count_change(from: u64, to: u64) -> i64 {
    let change = i128::from(to) - i128::from(from);
    i64::try_from(change).unwrap_or(if change > 0 { i64::MAX } else { i64::MIN })
}

/// Summary of one run.
pub fn summarize_run(run: &Run) -> RunSummary {
    let report = &run.results;
    RunSummary {
        id: run.id.clone(),
        run_number: run.run_number,
        file_name: run.file_name.clone(),
        sha: report.short_sha().to_string(),
        created_at: report.created_at.clone(),
        pipeline_id: report.pipeline_id.clone(),
        total_count: report.total_count,
        success_count: report.success_count,
        failed_count: report.failed_count,
        error_count: report.error_count,
        skipped_count: report.skipped_count,
        success_rate: report.success_rate(),
        suite_count: report.test_suites.len(),
        failing_suites: report
            .failing_suites()
            .into_iter()
            .map(String::from)
            .collect(),
        failed_case_count: report
            .test_suites
            .iter()
            .map(|s| s.failed_case_count())
            .sum(),
        total_time: report.total_time,
        total_time_display: format_duration(report.total_time),
    }
}

/// Format seconds as `"{m}m {s}s"`, or `"{s}s"` under a minute.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let remaining = seconds - minutes * 60.0;
    if minutes > 0.0 {
        format!("{}m {:.1}s", minutes as u64, remaining)
    } else {
        format!("{:.1}s", remaining)
    }
}
