//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Test Trend Server",
        version = "0.1.0",
        description = "Ingests CI test reports and serves run history plus cross-run trend metrics"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::info,
        // Run endpoints
        api::runs::get_history,
        api::runs::clear_history,
        api::runs::get_selected_run,
        api::runs::select_run,
        api::runs::get_run,
        // Ingest endpoints
        api::ingest::upload_runs,
        api::ingest::refresh,
        // Trend endpoints
        api::trends::get_trends,
        api::trends::get_trend_delta,
        api::trends::get_suite_trends,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            error::ParseErrorKind,
            // Health
            api::health::HealthResponse,
            api::health::ServerInfoResponse,
            // Reports
            models::TestStatus,
            models::TestCase,
            models::TestSuite,
            models::TestReport,
            // Runs
            models::Run,
            models::RunOrigin,
            models::RunListItem,
            models::HistoryResponse,
            models::RunSummary,
            // Ingest
            services::IngestReport,
            services::IngestWarning,
            services::WarningReason,
            services::CycleReport,
            // Trends
            models::TrendPoint,
            models::TrendDelta,
            models::SuiteTrend,
            models::SuiteTrendPoint,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Runs", description = "Run history and selection"),
        (name = "Ingest", description = "Report upload and source refresh"),
        (name = "Trends", description = "Cross-run trend metrics")
    )
)]
pub struct ApiDoc;
