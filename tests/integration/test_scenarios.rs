//! End-to-end scenarios over the library API: ingest, trend, correlate, select.

use test_trend_lib::error::{BatchError, NotFoundError};
use test_trend_lib::services::{
    RawPayload, WarningReason, compute_trends, correlate_suites, ingest_payloads, trend_delta,
};

use super::test_helpers::{new_store, payload, report_json, report_with_suites};

#[tokio::test]
async fn test_success_rate_drops_twenty_points_between_runs() {
    let (store, resolver) = new_store();
    let batch = vec![
        payload("run-1.json", &report_json(10, 10, 0)),
        payload("run-2.json", &report_json(10, 8, 2)),
    ];

    let report = ingest_payloads(&store, &resolver, batch).await.unwrap();
    assert_eq!(report.accepted.len(), 2);
    assert!(report.warnings.is_empty());

    let points = store.with_runs(compute_trends);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].success_rate, 100.0);
    assert_eq!(points[1].success_rate, 80.0);

    let delta = trend_delta(&points).expect("two runs yield a delta");
    assert_eq!(delta.success_rate_change, -20.0);
    assert_eq!(delta.test_count_change, 0);
    assert_eq!(delta.runs_analyzed, 2);
}

#[tokio::test]
async fn test_malformed_file_is_a_warning_not_a_rejection() {
    let (store, resolver) = new_store();
    let batch = vec![
        payload("run-1.json", &report_json(4, 4, 0)),
        RawPayload::new("run-2.json", "{not json"),
    ];

    let report = ingest_payloads(&store, &resolver, batch).await.unwrap();
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].file_name, "run-2.json");
    assert_eq!(report.warnings[0].reason, WarningReason::Malformed);
    assert_eq!(report.total_runs, 1);
}

#[tokio::test]
async fn test_missing_suite_is_an_explicit_gap() {
    let (store, resolver) = new_store();
    let batch = vec![
        payload("run-1.json", &report_with_suites(&[("unit", 5, 5)])),
        payload("run-2.json", &report_with_suites(&[("e2e", 3, 2)])),
    ];
    ingest_payloads(&store, &resolver, batch).await.unwrap();

    let trends = store.with_runs(correlate_suites);
    let unit = trends
        .iter()
        .find(|t| t.suite_name == "unit")
        .expect("unit suite correlated");

    assert_eq!(unit.data.len(), 2);
    assert!(unit.data[0].exists);
    assert_eq!(unit.data[0].test_count, 5);
    assert!(!unit.data[1].exists);
    assert_eq!(unit.data[1].test_count, 0);
    assert_eq!(unit.data[1].success_rate, 0.0);
    assert_eq!(unit.data[1].total_time, 0.0);
    assert_eq!(unit.runs_present(), 1);
}

#[tokio::test]
async fn test_selecting_unknown_run_keeps_selection() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-1.json", &report_json(1, 1, 0))],
    )
    .await
    .unwrap();
    let before = store.selected_run_id();
    assert!(before.is_some());

    let err = store.select("unknown-id").unwrap_err();
    assert_eq!(
        err,
        NotFoundError {
            id: "unknown-id".to_string()
        }
    );
    assert_eq!(store.selected_run_id(), before);
}

#[tokio::test]
async fn test_batches_merge_in_run_number_order() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![
            payload("build-7.json", &report_json(1, 1, 0)),
            payload("build-3.json", &report_json(1, 1, 0)),
        ],
    )
    .await
    .unwrap();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("build-5.json", &report_json(1, 1, 0))],
    )
    .await
    .unwrap();

    let numbers: Vec<u64> = store.with_runs(|runs| runs.iter().map(|r| r.run_number).collect());
    assert_eq!(numbers, vec![3, 5, 7]);
}

#[tokio::test]
async fn test_all_invalid_batch_leaves_history_untouched() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-1.json", &report_json(2, 2, 0))],
    )
    .await
    .unwrap();
    let before = store.snapshot();

    let err = ingest_payloads(
        &store,
        &resolver,
        vec![
            RawPayload::new("run-2.json", "[]"),
            RawPayload::new("notes.txt", "hello"),
        ],
    )
    .await
    .unwrap_err();

    assert_eq!(err, BatchError::EmptyBatch { skipped: 2 });
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn test_clear_resets_everything() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-1.json", &report_json(2, 2, 0))],
    )
    .await
    .unwrap();

    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.selected_run_id(), None);
    assert!(store.with_runs(compute_trends).is_empty());
    assert!(trend_delta(&store.with_runs(compute_trends)).is_none());
}
