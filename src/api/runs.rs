//! Run history API endpoints.

use actix_web::{HttpResponse, delete, get, put, web};

use crate::error::{AppError, AppResult};
use crate::models::{HistoryResponse, Run, RunListItem, RunSummary};
use crate::services::{RunHistoryStore, summarize_run};

/// Configure run routes.
/// Note: More specific routes must be registered before generic ones.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_history)
        .service(clear_history)
        .service(get_selected_run)
        .service(select_run)
        .service(get_run);
}

/// List every run in history order plus the selection cursor.
#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "Runs",
    responses(
        (status = 200, description = "Run history", body = HistoryResponse)
    )
)]
#[get("/history")]
pub async fn get_history(store: web::Data<RunHistoryStore>) -> HttpResponse {
    let history = store.snapshot();
    HttpResponse::Ok().json(HistoryResponse {
        runs: history.runs().iter().map(RunListItem::from).collect(),
        selected_run_id: history.selected_run_id().map(String::from),
    })
}

/// Drop every run and reset the selection.
#[utoipa::path(
    delete,
    path = "/api/v1/history",
    tag = "Runs",
    responses(
        (status = 204, description = "History cleared")
    )
)]
#[delete("/history")]
pub async fn clear_history(store: web::Data<RunHistoryStore>) -> HttpResponse {
    store.clear();
    HttpResponse::NoContent().finish()
}

/// Summary of the selected run.
#[utoipa::path(
    get,
    path = "/api/v1/runs/selected",
    tag = "Runs",
    responses(
        (status = 200, description = "Selected run summary", body = RunSummary),
        (status = 404, description = "No run selected", body = crate::error::ErrorResponse)
    )
)]
#[get("/runs/selected")]
pub async fn get_selected_run(store: web::Data<RunHistoryStore>) -> AppResult<HttpResponse> {
    let run = store
        .selected()
        .ok_or_else(|| AppError::NotFound("Selected run".to_string()))?;
    Ok(HttpResponse::Ok().json(summarize_run(&run)))
}

/// Move the selection cursor.
#[utoipa::path(
    put,
    path = "/api/v1/runs/{id}/select",
    tag = "Runs",
    params(
        ("id" = String, Path, description = "Run id")
    ),
    responses(
        (status = 204, description = "Run selected"),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    )
)]
#[put("/runs/{id}/select")]
pub async fn select_run(
    store: web::Data<RunHistoryStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    store.select(&path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Full run, including every suite and test case.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{id}",
    tag = "Runs",
    params(
        ("id" = String, Path, description = "Run id")
    ),
    responses(
        (status = 200, description = "Run details", body = Run),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/runs/{id}")]
pub async fn get_run(
    store: web::Data<RunHistoryStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let run = store
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Run {}", id)))?;
    Ok(HttpResponse::Ok().json(run))
}
