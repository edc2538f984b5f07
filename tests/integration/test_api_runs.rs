//! History, run lookup and selection endpoint tests.

use actix_web::{http::StatusCode, test};
use serde_json::Value;

use test_trend_lib::services::ingest_payloads;

use super::test_helpers::{create_test_app, new_store, payload, report_json};

#[actix_rt::test]
async fn test_history_empty_initially() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store, resolver, None)).await;

    let req = test::TestRequest::get().uri("/api/v1/history").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["runs"], Value::Array(vec![]));
    assert_eq!(body["selected_run_id"], Value::Null);
}

#[actix_rt::test]
async fn test_history_lists_runs_and_selection() {
    let (store, resolver) = new_store();
    let report = ingest_payloads(
        &store,
        &resolver,
        vec![
            payload("run-2.json", &report_json(10, 8, 2)),
            payload("run-1.json", &report_json(10, 10, 0)),
        ],
    )
    .await
    .unwrap();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let req = test::TestRequest::get().uri("/api/v1/history").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let runs = body["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["run_number"], 1);
    assert_eq!(runs[1]["run_number"], 2);
    assert_eq!(runs[1]["success_rate"], 80.0);
    assert_eq!(runs[0]["sha"], "01234567");
    // first batch selects the last run in sorted order
    assert_eq!(body["selected_run_id"], runs[1]["id"]);
    assert_eq!(report.accepted.len(), 2);
}

#[actix_rt::test]
async fn test_select_and_fetch_selected_run() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![
            payload("run-1.json", &report_json(10, 10, 0)),
            payload("run-2.json", &report_json(10, 8, 2)),
        ],
    )
    .await
    .unwrap();
    let first_id = store.snapshot().runs()[0].id.clone();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/runs/{}/select", first_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.selected_run_id(), Some(first_id.clone()));

    let req = test::TestRequest::get()
        .uri("/api/v1/runs/selected")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], first_id);
    assert_eq!(body["success_rate"], 100.0);
    assert_eq!(body["total_time_display"], "12.5s");
}

#[actix_rt::test]
async fn test_select_unknown_run_is_not_found() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-1.json", &report_json(1, 1, 0))],
    )
    .await
    .unwrap();
    let before = store.selected_run_id();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let req = test::TestRequest::put()
        .uri("/api/v1/runs/unknown-id/select")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(store.selected_run_id(), before);
}

#[actix_rt::test]
async fn test_get_run_by_id() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-1.json", &report_json(4, 3, 1))],
    )
    .await
    .unwrap();
    let id = store.snapshot().runs()[0].id.clone();
    let app = test::init_service(create_test_app(store, resolver, None)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/runs/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["file_name"], "run-1.json");
    assert_eq!(body["results"]["failed_count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/runs/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_selected_run_missing_when_history_empty() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store, resolver, None)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/runs/selected")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_clear_history() {
    let (store, resolver) = new_store();
    ingest_payloads(
        &store,
        &resolver,
        vec![payload("run-1.json", &report_json(1, 1, 0))],
    )
    .await
    .unwrap();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let req = test::TestRequest::delete().uri("/api/v1/history").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(store.is_empty());
    assert_eq!(store.selected_run_id(), None);
}

#[actix_rt::test]
async fn test_health_and_info() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store, resolver, None)).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/api/v1/info").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["runs_loaded"], 0);
    assert!(body.get("source").is_none());
}
