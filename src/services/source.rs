//! Report sources: where poll cycles fetch report files from.
//!
//! A source lists available report files (from an index file when present)
//! and fetches each one as a [`RawPayload`]. Two sources exist: a local
//! directory and a remote HTTP folder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::services::ingest::RawPayload;
use crate::services::validator;

/// A file a source can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub file_name: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceEntry {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            last_modified: None,
        }
    }
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Enumerate available report files.
    async fn list(&self) -> Result<Vec<SourceEntry>, SourceError>;

    /// Fetch a single file.
    async fn fetch(&self, entry: &SourceEntry) -> Result<RawPayload, SourceError>;
}

/// Index file contents: a bare list of names, or `{"files": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IndexFile {
    List(Vec<String>),
    Object { files: Vec<String> },
}

/// Parse an index file into the report file names it lists.
///
/// Names that would escape the source root are dropped.
pub fn parse_index(data: &[u8]) -> Result<Vec<String>, SourceError> {
    let index: IndexFile =
        serde_json::from_slice(data).map_err(|e| SourceError::InvalidIndex(e.to_string()))?;
    let names = match index {
        IndexFile::List(names) => names,
        IndexFile::Object { files } => files,
    };

    Ok(names
        .into_iter()
        .filter(|name| {
            let safe = is_safe_name(name);
            if !safe {
                warn!(file = %name, "Ignoring unsafe path in index file");
            }
            safe
        })
        .collect())
}

fn is_safe_name(name: &str) -> bool {
    let name = name.replace('\\', "/");
    !name.is_empty() && !name.contains("..") && !name.starts_with('/')
}

// ============================================================================
// Directory source
// ============================================================================

/// Reads reports from a local folder.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    index_file: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            index_file: index_file.into(),
        }
    }

    async fn modified(path: &Path) -> Option<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }

    fn io_error(path: &Path, source: std::io::Error) -> SourceError {
        SourceError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Every `*.json` file in the folder except the index itself.
    async fn scan(&self) -> Result<Vec<SourceEntry>, SourceError> {
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Self::io_error(&self.dir, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Self::io_error(&self.dir, e))?
        {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name == self.index_file || !validator::is_report_file(&file_name) {
                continue;
            }
            let last_modified = entry
                .metadata()
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);
            entries.push(SourceEntry {
                file_name,
                last_modified,
            });
        }

        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }
}

#[async_trait]
impl ReportSource for DirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    async fn list(&self) -> Result<Vec<SourceEntry>, SourceError> {
        let index_path = self.dir.join(&self.index_file);
        let index = match tokio::fs::read(&index_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "No index file, scanning directory");
                return self.scan().await;
            }
            Err(e) => return Err(Self::io_error(&index_path, e)),
        };

        let mut entries = Vec::new();
        for file_name in parse_index(&index)? {
            let last_modified = Self::modified(&self.dir.join(&file_name)).await;
            entries.push(SourceEntry {
                file_name,
                last_modified,
            });
        }
        Ok(entries)
    }

    async fn fetch(&self, entry: &SourceEntry) -> Result<RawPayload, SourceError> {
        let path = self.dir.join(&entry.file_name);
        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::io_error(&path, e))?;

        Ok(RawPayload {
            file_name: entry.file_name.clone(),
            content,
            last_modified: entry.last_modified,
        })
    }
}

// ============================================================================
// HTTP source
// ============================================================================

/// Reads reports from a remote folder that serves an index file.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    index_file: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, index_file: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index_file: index_file.into(),
            client: reqwest::Client::new(),
        }
    }

    /// URL of a file under the base URL, path segments encoded.
    pub fn file_url(&self, file_name: &str) -> String {
        let encoded: Vec<String> = file_name
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ReportSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn list(&self) -> Result<Vec<SourceEntry>, SourceError> {
        let url = self.file_url(&self.index_file);
        let body = self
            .get(&url)
            .await?
            .bytes()
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;

        Ok(parse_index(&body)?
            .into_iter()
            .map(SourceEntry::new)
            .collect())
    }

    async fn fetch(&self, entry: &SourceEntry) -> Result<RawPayload, SourceError> {
        let url = self.file_url(&entry.file_name);
        let response = self.get(&url).await?;

        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or(entry.last_modified);

        let content = response
            .bytes()
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?
            .to_vec();

        Ok(RawPayload {
            file_name: entry.file_name.clone(),
            content,
            last_modified,
        })
    }
}
