//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Development default values.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_MAX_UPLOAD_SIZE: usize = 52_428_800; // 50MB total per upload request
    pub const DEV_MAX_FILES_PER_REQUEST: usize = 100;
    pub const DEV_POLL_INTERVAL_SECS: u64 = 30;
    pub const DEV_INDEX_FILE: &str = "index.json";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Where poll cycles load report files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Directory(PathBuf),
    Http(String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory for static frontend assets
    pub static_dir: Option<PathBuf>,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Maximum files per upload request (default: 100)
    pub max_files_per_request: usize,
    /// Local folder of report files to poll
    pub reports_dir: Option<PathBuf>,
    /// Remote base URL of report files to poll
    pub reports_url: Option<String>,
    /// Seconds between poll cycles; 0 disables the background poller
    pub poll_interval_secs: u64,
    /// Index file name inside the report source
    pub index_file: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `TTS_HOST`: Server host (default: 127.0.0.1)
    /// - `TTS_PORT`: Server port (default: 8080)
    /// - `TTS_STATIC_DIR`: Static assets directory
    /// - `TTS_MAX_UPLOAD_SIZE`: Max upload size in bytes (default: 50MB)
    /// - `TTS_MAX_FILES_PER_REQUEST`: Max files per upload (default: 100)
    /// - `TTS_REPORTS_DIR`: Local report folder to poll
    /// - `TTS_REPORTS_URL`: Remote report folder to poll
    /// - `TTS_POLL_INTERVAL_SECS`: Poll interval (default: 30, 0 disables)
    /// - `TTS_INDEX_FILE`: Index file name (default: index.json)
    ///
    /// In production, at most one report source may be set, and polling must
    /// be enabled when one is.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("TTS_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("TTS_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("TTS_PORT must be a valid port number"))?;

        let max_upload_size = env::var("TTS_MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| defaults::DEV_MAX_UPLOAD_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("TTS_MAX_UPLOAD_SIZE must be a valid number"))?;

        let max_files_per_request = env::var("TTS_MAX_FILES_PER_REQUEST")
            .unwrap_or_else(|_| defaults::DEV_MAX_FILES_PER_REQUEST.to_string())
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::InvalidValue("TTS_MAX_FILES_PER_REQUEST must be a valid number")
            })?;

        let poll_interval_secs = env::var("TTS_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| defaults::DEV_POLL_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("TTS_POLL_INTERVAL_SECS must be a valid number")
            })?;

        let static_dir = non_empty_var("TTS_STATIC_DIR").map(PathBuf::from);
        let reports_dir = non_empty_var("TTS_REPORTS_DIR").map(PathBuf::from);
        let reports_url = non_empty_var("TTS_REPORTS_URL");
        let index_file =
            non_empty_var("TTS_INDEX_FILE").unwrap_or_else(|| defaults::DEV_INDEX_FILE.to_string());

        let config = Config {
            environment,
            host,
            port,
            static_dir,
            max_upload_size,
            max_files_per_request,
            reports_dir,
            reports_url,
            poll_interval_secs,
            index_file,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate production source settings.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.reports_dir.is_some() && self.reports_url.is_some() {
            errors.push(
                "TTS_REPORTS_DIR and TTS_REPORTS_URL are both set. Configure a single report source."
                    .to_string(),
            );
        }

        if self.source().is_some() && self.poll_interval_secs == 0 {
            errors.push(
                "TTS_POLL_INTERVAL_SECS is 0 while a report source is configured. Set a poll interval."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// The report source to poll, if any. A directory wins over a URL.
    pub fn source(&self) -> Option<SourceConfig> {
        if let Some(dir) = &self.reports_dir {
            return Some(SourceConfig::Directory(dir.clone()));
        }
        self.reports_url.clone().map(SourceConfig::Http)
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
