//! Ingestion endpoints: multipart report upload and manual refresh.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use futures_util::StreamExt;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::services::{
    CycleReport, IngestReport, Poller, RawPayload, RunHistoryStore, RunIdentityResolver,
    ingest_payloads,
};

/// Upload limits shared with the upload handler.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Maximum total bytes per request
    pub max_upload_size: usize,
    /// Maximum files per request
    pub max_files_per_request: usize,
}

/// Configure ingestion routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_runs).service(refresh);
}

/// Upload a batch of JSON report files.
///
/// Files that fail validation are reported as warnings; the request fails
/// only when none of them produce a run.
#[utoipa::path(
    post,
    path = "/api/v1/runs/upload",
    tag = "Ingest",
    request_body(content_type = "multipart/form-data", description = "One or more report files"),
    responses(
        (status = 200, description = "Batch ingested", body = IngestReport),
        (status = 413, description = "Too many files or bytes", body = crate::error::ErrorResponse),
        (status = 422, description = "No valid files in batch", body = crate::error::ErrorResponse)
    )
)]
#[post("/runs/upload")]
pub async fn upload_runs(
    mut payload: Multipart,
    store: web::Data<RunHistoryStore>,
    resolver: web::Data<RunIdentityResolver>,
    limits: web::Data<UploadLimits>,
) -> AppResult<HttpResponse> {
    let files = read_files(&mut payload, limits.get_ref()).await?;
    info!("Received {} files for ingestion", files.len());

    let report = ingest_payloads(store.get_ref(), resolver.get_ref(), files).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Read every file field into memory, enforcing the request limits.
async fn read_files(payload: &mut Multipart, limits: &UploadLimits) -> AppResult<Vec<RawPayload>> {
    let mut files = Vec::new();
    let mut total_size: usize = 0;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let file_name = match field.content_disposition().and_then(|cd| cd.get_filename()) {
            Some(name) => name.replace('\\', "/"),
            None => continue,
        };
        // keep only the last path component of browser-provided names
        let file_name = file_name
            .rsplit('/')
            .next()
            .unwrap_or(file_name.as_str())
            .to_string();

        if files.len() >= limits.max_files_per_request {
            return Err(AppError::PayloadTooLarge(format!(
                "At most {} files per request",
                limits.max_files_per_request
            )));
        }

        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            total_size += chunk.len();
            if total_size > limits.max_upload_size {
                warn!(
                    file = %file_name,
                    max_upload_size = limits.max_upload_size,
                    "Upload exceeds size limit"
                );
                return Err(AppError::PayloadTooLarge(format!(
                    "Upload exceeds {} bytes",
                    limits.max_upload_size
                )));
            }
            content.extend_from_slice(&chunk);
        }

        files.push(RawPayload::new(file_name, content));
    }

    Ok(files)
}

/// Run one poll cycle against the configured source now.
#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    tag = "Ingest",
    responses(
        (status = 200, description = "Cycle finished", body = CycleReport),
        (status = 404, description = "No report source configured", body = crate::error::ErrorResponse),
        (status = 422, description = "Source holds no valid files", body = crate::error::ErrorResponse),
        (status = 502, description = "Source unreachable", body = crate::error::ErrorResponse)
    )
)]
#[post("/refresh")]
pub async fn refresh(poller: Option<web::Data<Poller>>) -> AppResult<HttpResponse> {
    let poller = poller.ok_or_else(|| AppError::NotFound("Report source".to_string()))?;
    let report = poller.run_cycle().await?;
    Ok(HttpResponse::Ok().json(report))
}
