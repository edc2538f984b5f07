//! Poll cycles against a directory source, through the library and HTTP.

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use serde_json::Value;
use tempfile::TempDir;

use test_trend_lib::models::RunOrigin;
use test_trend_lib::services::{
    DirectorySource, Poller, RunHistoryStore, RunIdentityResolver, WarningReason,
    ingest_payloads,
};

use super::test_helpers::{create_test_app, new_store, payload, report_json};

fn write_report(dir: &TempDir, name: &str, contents: &str) {
    std::fs::write(dir.path().join(name), contents).expect("write report file");
}

fn directory_poller(
    dir: &TempDir,
    store: &RunHistoryStore,
    resolver: &RunIdentityResolver,
) -> Poller {
    let source = Arc::new(DirectorySource::new(dir.path(), "index.json"));
    Poller::new(source, store.clone(), resolver.clone())
}

#[tokio::test]
async fn test_cycle_loads_directory_and_surfaces_bad_files() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-1.json", &report_json(10, 10, 0).to_string());
    write_report(&dir, "run-2.json", &report_json(10, 9, 1).to_string());
    write_report(&dir, "run-3.json", "{not json");
    write_report(&dir, "notes.txt", "ignored");

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);

    let report = poller.run_cycle().await.unwrap();
    assert!(report.applied);
    assert_eq!(report.total_runs, 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].reason, WarningReason::Malformed);

    let names: Vec<String> =
        store.with_runs(|runs| runs.iter().map(|r| r.file_name.clone()).collect());
    assert_eq!(names, vec!["run-1.json", "run-2.json"]);
}

#[tokio::test]
async fn test_new_file_in_cycle_keeps_existing_selection() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-1.json", &report_json(10, 10, 0).to_string());
    write_report(&dir, "run-2.json", &report_json(10, 9, 1).to_string());

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);
    poller.run_cycle().await.unwrap();

    let first = store.snapshot().runs()[0].id.clone();
    store.select(&first).unwrap();

    write_report(&dir, "run-3.json", &report_json(10, 7, 3).to_string());
    let report = poller.run_cycle().await.unwrap();
    assert_eq!(report.total_runs, 3);

    let selected = store.selected().expect("selection survives the cycle");
    assert_eq!(selected.file_name, "run-1.json");
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_unchanged_folder_keeps_ids_and_uploaded_runs() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-1.json", &report_json(10, 10, 0).to_string());

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);
    poller.run_cycle().await.unwrap();
    let id_before = store.snapshot().runs()[0].id.clone();

    let upload = ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-7.json", &report_json(5, 4, 1))],
    )
    .await
    .unwrap();
    let uploaded_id = upload.accepted[0].clone();

    let report = poller.run_cycle().await.unwrap();
    assert!(report.applied);
    assert_eq!(report.total_runs, 2);

    let history = store.snapshot();
    assert_eq!(history.runs()[0].id, id_before);
    assert!(store.get(&id_before).is_some());
    let uploaded = store.get(&uploaded_id).expect("upload survives the cycle");
    assert_eq!(uploaded.origin, RunOrigin::Upload);
    assert_eq!(history.runs()[0].origin, RunOrigin::Source);
}

#[tokio::test]
async fn test_rewritten_file_gets_a_new_run() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-1.json", &report_json(10, 10, 0).to_string());

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);
    poller.run_cycle().await.unwrap();
    let id_before = store.snapshot().runs()[0].id.clone();

    write_report(&dir, "run-1.json", &report_json(10, 6, 4).to_string());
    poller.run_cycle().await.unwrap();

    let history = store.snapshot();
    assert_eq!(history.len(), 1);
    assert_ne!(history.runs()[0].id, id_before);
    assert_eq!(history.runs()[0].results.failed_count, 4);
    assert_eq!(history.selected_run_id(), Some(history.runs()[0].id.as_str()));
}

#[tokio::test]
async fn test_index_file_limits_what_is_loaded() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-1.json", &report_json(1, 1, 0).to_string());
    write_report(&dir, "run-2.json", &report_json(1, 1, 0).to_string());
    write_report(&dir, "index.json", r#"{"files": ["run-2.json", "missing.json"]}"#);

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);

    let report = poller.run_cycle().await.unwrap();
    assert_eq!(report.total_runs, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].file_name, "missing.json");
    assert_eq!(report.warnings[0].reason, WarningReason::FetchFailed);
}

#[tokio::test]
async fn test_empty_directory_keeps_previous_history() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-1.json", &report_json(1, 1, 0).to_string());

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);
    poller.run_cycle().await.unwrap();

    std::fs::remove_file(dir.path().join("run-1.json")).unwrap();
    assert!(poller.run_cycle().await.is_err());
    assert_eq!(store.len(), 1);
}

#[actix_rt::test]
async fn test_refresh_endpoint_runs_a_cycle() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "run-5.json", &report_json(4, 4, 0).to_string());

    let (store, resolver) = new_store();
    let poller = directory_poller(&dir, &store, &resolver);
    let app = test::init_service(create_test_app(
        store.clone(),
        resolver.clone(),
        Some(poller),
    ))
    .await;

    let req = test::TestRequest::post().uri("/api/v1/refresh").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["total_runs"], 1);
    assert_eq!(store.snapshot().runs()[0].run_number, 5);

    let req = test::TestRequest::get().uri("/api/v1/info").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["runs_loaded"], 1);
    assert!(body["source"].as_str().is_some());
}
