//! GitHub-backed content store
//!
//! Reads and writes single files in a repository through the Contents API.
//! Every write carries the content hash of the revision it replaces, so the
//! server itself arbitrates concurrent writers: a stale hash is rejected and
//! surfaced to the caller, never retried here.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use catnav_types::NavigationDocument;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::api::{self, CommitResult, ConnectionStatus, ContentsResponse, RepositoryResponse, WriteRequest};
use crate::config::{EnvSettings, RepositoryCoordinates, SettingsSource, StoreSettings};
use crate::document::{self, EncodeOptions};
use crate::error::{ContentStoreError, Result};
use crate::http::{self, HttpExecutor, HttpRequest, HttpResponse, ReqwestExecutor};

/// Encoded in slices that are a multiple of three bytes so the concatenated
/// output only carries padding at the very end.
const UPLOAD_CHUNK_SIZE: usize = 3 * 16 * 1024;

/// Payload of a fetched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 text decoded from the transfer encoding
    Text(String),
    /// The base64 payload exactly as the server sent it
    Base64(String),
}

impl FileContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(text) => Some(text),
            FileContent::Base64(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FileContent::Text(text) => Some(text),
            FileContent::Base64(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Logical path the caller asked for
    pub path: String,
    pub content: FileContent,
    /// Optimistic-concurrency token for the next write to this file
    pub sha: String,
    /// Path as reported by the server
    pub resolved_path: String,
}

/// Read-modify-write access to files in one GitHub repository.
///
/// The store holds no per-call state. Coordinates are resolved from the
/// settings source on every operation.
#[derive(Clone)]
pub struct ContentStore {
    source: Arc<dyn SettingsSource>,
    executor: Arc<dyn HttpExecutor>,
    settings: StoreSettings,
}

impl ContentStore {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            source: Arc::new(EnvSettings),
            executor,
            settings: StoreSettings::default(),
        }
    }

    /// Store backed by reqwest and the process environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(ReqwestExecutor::new()))
    }

    pub fn with_settings_source(mut self, source: Arc<dyn SettingsSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn executor(&self) -> Arc<dyn HttpExecutor> {
        self.executor.clone()
    }

    pub fn resolve_configuration(&self) -> Result<RepositoryCoordinates> {
        RepositoryCoordinates::resolve(self.source.as_ref())
    }

    /// Fetch a file and its current content hash.
    ///
    /// Text files are decoded from base64 and then as strict UTF-8. With
    /// `is_binary` the base64 payload is handed back untouched.
    pub async fn fetch_file(&self, path: &str, is_binary: bool) -> Result<RemoteFile> {
        let coords = self.resolve_configuration()?;
        let url = api::contents_url(&coords, path)?;
        debug!(%url, is_binary, "fetch_file: called");

        let request = api::authorize(HttpRequest::get(url.as_str()), &coords, &self.settings.user_agent);
        let response = self
            .send(request, "fetching file", self.settings.read_timeout())
            .await?;

        if !response.is_success() {
            debug!(status = response.status, "fetch_file: request failed");
            return Err(api::read_failure(path, &response));
        }

        let body: ContentsResponse = api::parse_body(&response, "contents")?;
        let encoded = body.content.ok_or_else(|| {
            ContentStoreError::MalformedResponse(format!("response for '{}' has no content field", path))
        })?;
        let sha = body.sha.ok_or_else(|| {
            ContentStoreError::MalformedResponse(format!("response for '{}' has no sha field", path))
        })?;

        // The contents API sends "" for files over 1 MB
        let content = if is_binary {
            FileContent::Base64(encoded)
        } else if encoded.is_empty() {
            return Err(ContentStoreError::MalformedResponse(format!(
                "response for '{}' has empty content (files over 1 MB are not inlined)",
                path
            )));
        } else {
            FileContent::Text(decode_text(&encoded)?)
        };

        debug!(%sha, "fetch_file: success");
        Ok(RemoteFile {
            path: path.to_string(),
            content,
            sha,
            resolved_path: body.path.unwrap_or_else(|| path.to_string()),
        })
    }

    /// Replace a text file, provided `sha` is still its current hash.
    pub async fn update_file(&self, path: &str, content: &str, message: &str, sha: &str) -> Result<CommitResult> {
        let coords = self.resolve_configuration()?;
        debug!(path, bytes = content.len(), "update_file: called");

        let body = WriteRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            sha: Some(sha),
            branch: &coords.branch,
        };
        self.put_contents(&coords, path, &body, "saving file", self.settings.write_timeout())
            .await
    }

    /// Create or replace a binary file.
    ///
    /// Existence is probed first to learn the current hash. Only a definite
    /// "not found" counts as the create case; any other probe failure aborts
    /// the upload rather than risk an unintended overwrite.
    pub async fn upload_binary(&self, path: &str, bytes: &[u8], message: &str) -> Result<CommitResult> {
        let coords = self.resolve_configuration()?;
        debug!(path, bytes = bytes.len(), "upload_binary: called");

        let existing_sha = match self.fetch_file(path, true).await {
            Ok(file) => Some(file.sha),
            Err(e) if e.is_not_found() => {
                debug!(path, "upload_binary: file does not exist yet");
                None
            }
            Err(e) => {
                warn!(path, error = %e, "upload_binary: existence check failed");
                return Err(ContentStoreError::Precheck {
                    path: path.to_string(),
                    source: Box::new(e),
                });
            }
        };

        let body = WriteRequest {
            message,
            content: encode_chunked(bytes),
            sha: existing_sha.as_deref(),
            branch: &coords.branch,
        };
        self.put_contents(&coords, path, &body, "uploading file", self.settings.upload_timeout())
            .await
    }

    /// Load the navigation document, tagged with the hash it was read at.
    pub async fn load_navigation_document(&self) -> Result<NavigationDocument> {
        let file = self.fetch_file(&self.settings.data_path, false).await?;
        let text = file.content.into_text().ok_or_else(|| {
            ContentStoreError::MalformedResponse("navigation data was not fetched as text".to_string())
        })?;

        let mut document: NavigationDocument = document::decode(&text)?;
        document.set_file_sha(file.sha);
        debug!(
            categories = document.categories.len(),
            sites = document.site_count(),
            "load_navigation_document: success"
        );
        Ok(document)
    }

    /// Commit `document` over the current revision of the data file.
    ///
    /// The current hash is always fetched fresh; a hash carried on the
    /// document from an earlier load is never used for the write.
    pub async fn save_navigation_document(&self, document: &NavigationDocument) -> Result<CommitResult> {
        let path = self.settings.data_path.clone();
        let current = self.fetch_file(&path, false).await?;

        if let Some(held) = document.file_sha()
            && held != current.sha
        {
            warn!(held, current = %current.sha, "document was loaded from an older revision");
        }

        let content = document::encode(
            &document.without_file_sha(),
            EncodeOptions {
                emit_format_marker: self.settings.emit_format_marker,
            },
        )?;
        let message = commit_message(Local::now());

        self.update_file(&path, &content, &message, &current.sha).await
    }

    /// Non-destructive health check. Never fails; problems are reported in
    /// the returned status.
    pub async fn verify_connection(&self) -> ConnectionStatus {
        match self.fetch_repository().await {
            Ok(repository) => {
                info!(repository = %repository.full_name, "connected to GitHub");
                ConnectionStatus::Connected {
                    repository: repository.full_name,
                    permissions: repository.permissions,
                }
            }
            Err(e) => {
                debug!(error = %e, "verify_connection: failed");
                ConnectionStatus::Disconnected { message: e.to_string() }
            }
        }
    }

    async fn fetch_repository(&self) -> Result<RepositoryResponse> {
        let coords = self.resolve_configuration()?;
        let url = api::repository_url(&coords)?;
        debug!(%url, "fetch_repository: called");

        let request = api::authorize(HttpRequest::get(url.as_str()), &coords, &self.settings.user_agent);
        let response = self
            .send(request, "checking repository access", self.settings.read_timeout())
            .await?;

        if !response.is_success() {
            return Err(api::read_failure(&coords.full_name(), &response));
        }

        api::parse_body(&response, "repository")
    }

    async fn put_contents(
        &self,
        coords: &RepositoryCoordinates,
        path: &str,
        body: &WriteRequest<'_>,
        operation: &'static str,
        budget: Duration,
    ) -> Result<CommitResult> {
        let url = api::contents_url(coords, path)?;
        let payload = serde_json::to_vec(body)?;

        let request = api::authorize(HttpRequest::put(url.as_str(), payload), coords, &self.settings.user_agent)
            .header("Content-Type", "application/json");
        let response = self.send(request, operation, budget).await?;

        if !response.is_success() {
            warn!(path, status = response.status, "write rejected");
            return Err(api::write_failure(&response));
        }

        let result: CommitResult = api::parse_body(&response, "commit")?;
        info!(
            path,
            replaced = body.sha.is_some(),
            commit = result.commit_sha().unwrap_or("unknown"),
            "committed file"
        );
        Ok(result)
    }

    async fn send(&self, request: HttpRequest, operation: &'static str, budget: Duration) -> Result<HttpResponse> {
        http::execute_with_timeout(self.executor.as_ref(), request, operation, budget).await
    }
}

/// Decode GitHub's line-wrapped base64 into UTF-8 text.
fn decode_text(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| ContentStoreError::MalformedResponse(format!("content is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ContentStoreError::MalformedResponse(format!("content is not valid UTF-8: {}", e)))
}

fn encode_chunked(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(UPLOAD_CHUNK_SIZE) {
        BASE64.encode_string(chunk, &mut encoded);
    }
    encoded
}

fn commit_message(at: DateTime<Local>) -> String {
    format!("chore: update navigation data - {}", at.format("%Y-%m-%d %H:%M:%S"))
}
