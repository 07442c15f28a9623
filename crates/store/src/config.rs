//! Repository coordinates and store settings
//!
//! Credentials and repository coordinates come from a [`SettingsSource`] that
//! is consulted on every operation, so a changed environment takes effect on
//! the next call. Everything that is not a secret lives in [`StoreSettings`].

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ContentStoreError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_DATA_PATH: &str = "src/mock/mock_data.js";
pub const USER_AGENT: &str = concat!("catnav-store/", env!("CARGO_PKG_VERSION"));

/// Optional override for GitHub Enterprise or test servers.
pub const API_BASE_VAR: &str = "CATNAV_GITHUB_API_BASE";

/// A required setting, in the order resolution checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSetting {
    Token,
    Owner,
    Repository,
    Branch,
}

impl ConfigSetting {
    pub const REQUIRED: [ConfigSetting; 4] = [
        ConfigSetting::Token,
        ConfigSetting::Owner,
        ConfigSetting::Repository,
        ConfigSetting::Branch,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            ConfigSetting::Token => "CATNAV_GITHUB_TOKEN",
            ConfigSetting::Owner => "CATNAV_GITHUB_OWNER",
            ConfigSetting::Repository => "CATNAV_GITHUB_REPO",
            ConfigSetting::Branch => "CATNAV_GITHUB_BRANCH",
        }
    }
}

impl fmt::Display for ConfigSetting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigSetting::Token => write!(f, "GitHub token"),
            ConfigSetting::Owner => write!(f, "GitHub owner"),
            ConfigSetting::Repository => write!(f, "GitHub repository"),
            ConfigSetting::Branch => write!(f, "GitHub branch"),
        }
    }
}

/// Where raw setting values come from.
pub trait SettingsSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Everything needed to address the tracked repository.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryCoordinates {
    pub api_base: Url,
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepositoryCoordinates {
    /// Resolve coordinates, failing on the first missing required setting.
    pub fn resolve(source: &dyn SettingsSource) -> Result<Self> {
        let required = |setting: ConfigSetting| match source.get(setting.env_var()) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ContentStoreError::Configuration { setting }),
        };

        let token = required(ConfigSetting::Token)?;
        let owner = required(ConfigSetting::Owner)?;
        let repo = required(ConfigSetting::Repository)?;
        let branch = required(ConfigSetting::Branch)?;

        let api_base = source
            .get(API_BASE_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_base: parse_api_base(api_base.trim())?,
            token,
            owner,
            repo,
            branch,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Debug for RepositoryCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RepositoryCoordinates")
            .field("api_base", &self.api_base.as_str())
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}

fn parse_api_base(value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| {
        ContentStoreError::InvalidConfiguration(format!("{} '{}' is not a URL: {}", API_BASE_VAR, value, e))
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ContentStoreError::InvalidConfiguration(format!(
            "{} '{}' must be an http(s) base URL",
            API_BASE_VAR, value
        )));
    }

    Ok(url)
}

/// Non-secret store behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoreSettings {
    /// Repository path of the tracked navigation data file
    pub data_path: String,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub upload_timeout_ms: u64,
    pub user_agent: String,

    /// Prepend the versioned format marker line when writing the data file
    pub emit_format_marker: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATA_PATH.to_string(),
            read_timeout_ms: 10_000,
            write_timeout_ms: 15_000,
            upload_timeout_ms: 30_000,
            user_agent: USER_AGENT.to_string(),
            emit_format_marker: false,
        }
    }
}

impl StoreSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }
}
