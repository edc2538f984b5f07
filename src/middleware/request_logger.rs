//! Request logging middleware.
//!
//! Every request runs inside an `http_request` span carrying its method,
//! path and client address, so anything the handlers and services log while
//! serving it is attributed to the request. One completion line follows,
//! with the level picked from the status class. Paths polled by dashboards
//! and probes complete at debug level when they succeed.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Paths that complete at debug level on success.
const DEFAULT_QUIET_PATHS: &[&str] = &["/api/v1/health", "/api/v1/ws"];

/// Request logger middleware factory.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogger {
    quiet_paths: &'static [&'static str],
}

impl RequestLogger {
    pub fn new() -> Self {
        Self {
            quiet_paths: DEFAULT_QUIET_PATHS,
        }
    }

    pub fn with_quiet_paths(quiet_paths: &'static [&'static str]) -> Self {
        Self { quiet_paths }
    }

    fn is_quiet(&self, path: &str) -> bool {
        self.quiet_paths.contains(&path)
    }
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware {
            service,
            logger: *self,
        }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
    logger: RequestLogger,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let quiet = self.logger.is_quiet(req.path());

        let span = {
            let conn = req.connection_info();
            info_span!(
                target: "api",
                "http_request",
                method = %req.method(),
                path = %req.path(),
                client = conn.realip_remote_addr().unwrap_or("unknown"),
            )
        };

        let fut = span.in_scope(|| self.service.call(req));

        Box::pin(
            async move {
                let outcome = fut.await;
                let duration_ms = started.elapsed().as_millis() as u64;
                match &outcome {
                    Ok(res) => log_completion(res.status(), duration_ms, quiet),
                    Err(e) => error!(target: "api", duration_ms, error = %e, "Request failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}

fn log_completion(status: StatusCode, duration_ms: u64, quiet: bool) {
    let status = status.as_u16();
    match status {
        500.. => error!(target: "api", status, duration_ms, "Server error"),
        400..=499 => warn!(target: "api", status, duration_ms, "Client error"),
        _ if quiet => debug!(target: "api", status, duration_ms, "Request completed"),
        _ => info!(target: "api", status, duration_ms, "Request completed"),
    }
}
