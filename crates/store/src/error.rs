use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigSetting;

#[derive(Error, Debug)]
pub enum ContentStoreError {
    #[error("{} is not configured: set the {} environment variable", .setting, .setting.env_var())]
    Configuration { setting: ConfigSetting },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Timed out after {}s while {operation}; check the network connection", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Network request failed: {0}")]
    NetworkError(String),

    #[error(
        "GitHub authentication failed (HTTP {status}): {message}. Check that {} holds a valid token",
        ConfigSetting::Token.env_var()
    )]
    Auth { status: u16, message: String },

    #[error("File '{path}' not found: {message}")]
    NotFound { path: String, message: String },

    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed GitHub response: {0}")]
    MalformedResponse(String),

    #[error("Data file format not recognized: {0}")]
    Format(String),

    #[error("Failed to parse navigation data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("GitHub rejected the write (HTTP {status}): {message}")]
    RemoteRejection { status: u16, message: String },

    #[error("Could not determine whether '{path}' already exists: {source}")]
    Precheck {
        path: String,
        #[source]
        source: Box<ContentStoreError>,
    },

    #[error("IO operation '{operation}' failed on path '{path}': {source}")]
    IoOperation {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ContentStoreError>;

impl ContentStoreError {
    /// Whether a caller could reasonably try the same call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ContentStoreError::Timeout { .. } => true,
            ContentStoreError::NetworkError(_) => true,
            ContentStoreError::HttpStatus { status, .. } => *status >= 500,
            ContentStoreError::RemoteRejection { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// A write refused because the supplied content hash is no longer current.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ContentStoreError::RemoteRejection { status: 409, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentStoreError::NotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        match self {
            ContentStoreError::Auth { .. } => true,
            ContentStoreError::RemoteRejection { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ContentStoreError::Configuration { .. }
                | ContentStoreError::InvalidConfiguration(_)
                | ContentStoreError::InvalidPath(_)
                | ContentStoreError::Auth { .. }
        )
    }
}
