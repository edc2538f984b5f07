//! Test Trend Server - Main entry point.
//!
//! Starts the Actix-web server, the optional report poller and static SPA
//! serving.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use test_trend_lib::api::{self, ApiDoc, UploadLimits};
use test_trend_lib::config::{Config, SourceConfig};
use test_trend_lib::middleware::RequestLogger;
use test_trend_lib::services::{
    DirectorySource, EventBroadcaster, HttpSource, Poller, ReportSource, RunHistoryStore,
    RunIdentityResolver,
};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

fn build_source(config: &Config) -> Option<Arc<dyn ReportSource>> {
    let source: Arc<dyn ReportSource> = match config.source()? {
        SourceConfig::Directory(dir) => {
            Arc::new(DirectorySource::new(dir, config.index_file.clone()))
        }
        SourceConfig::Http(url) => Arc::new(HttpSource::new(url, config.index_file.clone())),
    };
    Some(source)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, set at most one of TTS_REPORTS_DIR / TTS_REPORTS_URL");
            error!("  - In production, TTS_POLL_INTERVAL_SECS must be non-zero with a source");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Test Trend Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let broadcaster = EventBroadcaster::new();
    let store = RunHistoryStore::new(broadcaster.clone());
    let resolver = RunIdentityResolver::default();

    let poller = build_source(&config)
        .map(|source| Poller::new(source, store.clone(), resolver.clone()));

    match &poller {
        Some(poller) if config.poll_interval_secs > 0 => {
            // first cycle runs on the first tick, which fires immediately
            let _poll_task = poller.clone().start(config.poll_interval_secs);
        }
        Some(poller) => info!(
            "Polling disabled; refresh {} via POST /api/v1/refresh",
            poller.describe_source()
        ),
        None => info!("No report source configured; runs arrive by upload only"),
    }

    let bind_address = config.bind_address();
    let limits = UploadLimits {
        max_upload_size: config.max_upload_size,
        max_files_per_request: config.max_files_per_request,
    };
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    info!(
        "Upload limits: {}MB max size, {} files per request",
        limits.max_upload_size / 1024 / 1024,
        limits.max_files_per_request
    );

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_origin("http://localhost:5173")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            .wrap(cors)
            .wrap(RequestLogger::new())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(broadcaster.clone()))
            .app_data(web::Data::new(limits))
            .configure(api::configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api/v1/openapi.json", ApiDoc::openapi()),
            );

        if let Some(poller) = &poller {
            app = app.app_data(web::Data::new(poller.clone()));
        }

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .service(Files::new("/favicon", dir.clone()).index_file("favicon.ico"))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
