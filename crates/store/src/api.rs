//! GitHub Contents API helpers
//!
//! Centralizes URL construction, request headers and response decoding so the
//! store only deals with coordinates and typed results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::RepositoryCoordinates;
use crate::error::{ContentStoreError, Result};
use crate::http::{HttpRequest, HttpResponse};

pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
pub const API_VERSION: &str = "2022-11-28";

/// `{base}/repos/{owner}/{repo}/contents/{path}` with every path segment
/// percent-encoded on its own.
pub fn contents_url(coords: &RepositoryCoordinates, path: &str) -> Result<Url> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(ContentStoreError::InvalidPath(format!(
            "'{}' does not name a file",
            path
        )));
    }

    endpoint(
        coords,
        ["repos", coords.owner.as_str(), coords.repo.as_str(), "contents"]
            .into_iter()
            .chain(segments),
    )
}

/// `{base}/repos/{owner}/{repo}`
pub fn repository_url(coords: &RepositoryCoordinates) -> Result<Url> {
    endpoint(coords, ["repos", coords.owner.as_str(), coords.repo.as_str()])
}

fn endpoint<'a>(coords: &RepositoryCoordinates, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = coords.api_base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            ContentStoreError::InvalidConfiguration(format!(
                "API base '{}' cannot carry a path",
                coords.api_base
            ))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Attach the authentication and versioning headers every call carries.
pub fn authorize(request: HttpRequest, coords: &RepositoryCoordinates, user_agent: &str) -> HttpRequest {
    request
        .header("Authorization", format!("Bearer {}", coords.token))
        .header("Accept", ACCEPT_HEADER)
        .header("X-GitHub-Api-Version", API_VERSION)
        .header("User-Agent", user_agent)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Human-readable message for a failed call.
///
/// Prefers the `message` GitHub puts in its error bodies and falls back to
/// the status line when the body is not the expected JSON.
pub fn error_message(response: &HttpResponse) -> String {
    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => format!("GitHub API error: {}", body.message),
        Err(_) => format!("HTTP {}: {}", response.status, response.reason()),
    }
}

/// Classify a non-success response on a read path.
pub fn read_failure(target: &str, response: &HttpResponse) -> ContentStoreError {
    let message = error_message(response);
    match response.status {
        401 | 403 => ContentStoreError::Auth {
            status: response.status,
            message,
        },
        404 => ContentStoreError::NotFound {
            path: target.to_string(),
            message,
        },
        status => ContentStoreError::HttpStatus { status, message },
    }
}

/// Classify a non-success response on a write path.
pub fn write_failure(response: &HttpResponse) -> ContentStoreError {
    ContentStoreError::RemoteRejection {
        status: response.status,
        message: error_message(response),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentsResponse {
    pub content: Option<String>,
    pub sha: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryResponse {
    pub full_name: String,
    #[serde(default)]
    pub permissions: BTreeMap<String, bool>,
}

/// Body of a create-or-update contents call.
#[derive(Debug, Serialize)]
pub(crate) struct WriteRequest<'a> {
    pub message: &'a str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| ContentStoreError::MalformedResponse(format!("could not read {} response: {}", what, e)))
}

/// Commit metadata returned by a successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitResult(Value);

impl CommitResult {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Hash of the file as written; the token for the next update.
    pub fn content_sha(&self) -> Option<&str> {
        self.0.pointer("/content/sha").and_then(Value::as_str)
    }

    pub fn commit_sha(&self) -> Option<&str> {
        self.0.pointer("/commit/sha").and_then(Value::as_str)
    }

    pub fn commit_url(&self) -> Option<&str> {
        self.0.pointer("/commit/html_url").and_then(Value::as_str)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

/// Outcome of a connectivity check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected {
        repository: String,
        permissions: BTreeMap<String, bool>,
    },
    Disconnected { message: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}
