//! API endpoint modules.

pub mod health;
pub mod ingest;
pub mod openapi;
pub mod runs;
pub mod trends;
pub mod websocket;

pub use health::configure_health_routes;
pub use ingest::{UploadLimits, configure_routes as configure_ingest_routes};
pub use openapi::ApiDoc;
pub use runs::configure_routes as configure_run_routes;
pub use trends::configure_routes as configure_trend_routes;
pub use websocket::configure_routes as configure_websocket_routes;

use actix_web::web;

/// Mount every `/api/v1` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(configure_health_routes)
            .configure(configure_ingest_routes)
            .configure(configure_run_routes)
            .configure(configure_trend_routes)
            .configure(configure_websocket_routes),
    );
}
