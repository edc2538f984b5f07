//! Upload and refresh endpoint tests.

use actix_web::{http::StatusCode, test};
use serde_json::Value;

use super::test_helpers::{
    create_test_app, multipart_body, multipart_content_type, new_store, report_json,
};

#[actix_rt::test]
async fn test_upload_accepts_valid_files_and_reports_warnings() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let body = multipart_body(&[
        ("run-1.json", report_json(10, 10, 0).to_string()),
        ("run-2.json", "{not json".to_string()),
        ("readme.md", "# notes".to_string()),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/v1/runs/upload")
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["accepted"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["warnings"][0]["file_name"], "run-2.json");
    assert_eq!(body["warnings"][0]["reason"], "malformed");
    assert_eq!(body["ignored"], 1);
    assert_eq!(body["total_runs"], 1);
    assert_eq!(store.len(), 1);
}

#[actix_rt::test]
async fn test_upload_with_no_valid_files_is_unprocessable() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let body = multipart_body(&[("run-1.json", "{\"sha\": 1}".to_string())]);
    let req = test::TestRequest::post()
        .uri("/api/v1/runs/upload")
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NO_VALID_FILES");
    assert!(store.is_empty());
}

#[actix_rt::test]
async fn test_upload_rejects_too_many_files() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let files: Vec<(String, String)> = (1..=6)
        .map(|i| (format!("run-{}.json", i), report_json(1, 1, 0).to_string()))
        .collect();
    let refs: Vec<(&str, String)> = files
        .iter()
        .map(|(name, content)| (name.as_str(), content.clone()))
        .collect();

    let req = test::TestRequest::post()
        .uri("/api/v1/runs/upload")
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(multipart_body(&refs))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store.is_empty());
}

#[actix_rt::test]
async fn test_upload_strips_directories_from_file_names() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store.clone(), resolver, None)).await;

    let body = multipart_body(&[("nightly/run-42.json", report_json(3, 3, 0).to_string())]);
    let req = test::TestRequest::post()
        .uri("/api/v1/runs/upload")
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let runs = store.snapshot();
    assert_eq!(runs.runs()[0].file_name, "run-42.json");
    assert_eq!(runs.runs()[0].run_number, 42);
}

#[actix_rt::test]
async fn test_refresh_without_source_is_not_found() {
    let (store, resolver) = new_store();
    let app = test::init_service(create_test_app(store, resolver, None)).await;

    let req = test::TestRequest::post().uri("/api/v1/refresh").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
