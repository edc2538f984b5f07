//! Domain error types for the test trend server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Why a single payload could not be turned into a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Not well-formed JSON (or not UTF-8)
    Malformed,
    /// Well-formed, but required fields are missing or mistyped
    SchemaMismatch,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed"),
            Self::SchemaMismatch => write!(f, "schema mismatch"),
        }
    }
}

/// Report validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ParseErrorKind::Malformed,
            message: message.into(),
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self {
            kind: ParseErrorKind::SchemaMismatch,
            message: message.into(),
        }
    }
}

/// Batch-level ingestion failure. History is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("No valid JSON test files found ({skipped} skipped)")]
    EmptyBatch { skipped: usize },
}

/// Lookup of a run id that is not in history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Run {id} not found")]
pub struct NotFoundError {
    pub id: String,
}

/// Report source I/O failure (index listing, file fetch).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid index file: {0}")]
    InvalidIndex(String),
}

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every file in a batch was rejected
    #[error("{0}")]
    NoValidFiles(String),

    /// Upload exceeds configured limits
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Report source could not be read
    #[error("Source error: {0}")]
    Source(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = match self {
            AppError::NotFound(_) => (actix_web::http::StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput(_) => {
                (actix_web::http::StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            AppError::NoValidFiles(_) => (
                actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
                "NO_VALID_FILES",
            ),
            AppError::PayloadTooLarge(_) => (
                actix_web::http::StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
            ),
            AppError::Source(err_str) => {
                tracing::error!("Source error: {}", err_str);
                (actix_web::http::StatusCode::BAD_GATEWAY, "SOURCE_ERROR")
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: self.to_string(),
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for domain errors

impl From<NotFoundError> for AppError {
    fn from(err: NotFoundError) -> Self {
        AppError::NotFound(format!("Run {}", err.id))
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::NoValidFiles(err.to_string())
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::Source(err.to_string())
    }
}
