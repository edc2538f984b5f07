//! Trend API endpoints.
//!
//! Everything here is recomputed from the current history on each request.

use actix_web::{HttpResponse, get, web};

use crate::models::{SuiteTrend, TrendDelta, TrendPoint};
use crate::services::{RunHistoryStore, compute_trends, correlate_suites, trend_delta};

/// Configure trend routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_trend_delta)
        .service(get_trends)
        .service(get_suite_trends);
}

/// One trend point per run, in history order.
#[utoipa::path(
    get,
    path = "/api/v1/trends",
    tag = "Trends",
    responses(
        (status = 200, description = "Run-level trend series", body = Vec<TrendPoint>)
    )
)]
#[get("/trends")]
pub async fn get_trends(store: web::Data<RunHistoryStore>) -> HttpResponse {
    let points = store.with_runs(compute_trends);
    HttpResponse::Ok().json(points)
}

/// First-to-last change across history; `null` with fewer than two runs.
#[utoipa::path(
    get,
    path = "/api/v1/trends/delta",
    tag = "Trends",
    responses(
        (status = 200, description = "Net drift, or null", body = Option<TrendDelta>)
    )
)]
#[get("/trends/delta")]
pub async fn get_trend_delta(store: web::Data<RunHistoryStore>) -> HttpResponse {
    let delta = store.with_runs(|runs| trend_delta(&compute_trends(runs)));
    HttpResponse::Ok().json(delta)
}

/// Per-suite series aligned across every run.
#[utoipa::path(
    get,
    path = "/api/v1/suites/trends",
    tag = "Trends",
    responses(
        (status = 200, description = "Suite trend series", body = Vec<SuiteTrend>)
    )
)]
#[get("/suites/trends")]
pub async fn get_suite_trends(store: web::Data<RunHistoryStore>) -> HttpResponse {
    let trends = store.with_runs(correlate_suites);
    HttpResponse::Ok().json(trends)
}
