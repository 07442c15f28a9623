use std::path::{Path, PathBuf};
use std::time::Duration;

use catnav_store::StoreSettings;
use directories::ProjectDirs;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// CLI settings. Credentials are never stored here; they always come from
/// the `CATNAV_GITHUB_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub icons: IconsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct IconsConfig {
    pub output_dir: String,
    pub delay_ms: u64,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            output_dir: "public/sitelogo".to_string(),
            delay_ms: 500,
        }
    }
}

impl IconsConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["store", "data-path"] => {
                if value.trim().is_empty() {
                    return Err(eyre::eyre!("data-path cannot be empty"));
                }
                self.store.data_path = value.to_string();
            }
            ["store", "read-timeout-ms"] => self.store.read_timeout_ms = parse_millis(value)?,
            ["store", "write-timeout-ms"] => self.store.write_timeout_ms = parse_millis(value)?,
            ["store", "upload-timeout-ms"] => self.store.upload_timeout_ms = parse_millis(value)?,
            ["store", "user-agent"] => self.store.user_agent = value.to_string(),
            ["store", "emit-format-marker"] => {
                self.store.emit_format_marker = value
                    .parse::<bool>()
                    .map_err(|_| eyre::eyre!("Invalid boolean value: {}", value))?;
            }
            ["icons", "output-dir"] => self.icons.output_dir = value.to_string(),
            ["icons", "delay-ms"] => {
                self.icons.delay_ms = value
                    .parse::<u64>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        let value = match parts.as_slice() {
            ["store", "data-path"] => self.store.data_path.clone(),
            ["store", "read-timeout-ms"] => self.store.read_timeout_ms.to_string(),
            ["store", "write-timeout-ms"] => self.store.write_timeout_ms.to_string(),
            ["store", "upload-timeout-ms"] => self.store.upload_timeout_ms.to_string(),
            ["store", "user-agent"] => self.store.user_agent.clone(),
            ["store", "emit-format-marker"] => self.store.emit_format_marker.to_string(),
            ["icons", "output-dir"] => self.icons.output_dir.clone(),
            ["icons", "delay-ms"] => self.icons.delay_ms.to_string(),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        };

        Ok(value)
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             Store:\n\
             ├─ data-path: {}\n\
             ├─ read-timeout-ms: {}\n\
             ├─ write-timeout-ms: {}\n\
             ├─ upload-timeout-ms: {}\n\
             ├─ user-agent: {}\n\
             └─ emit-format-marker: {}\n\
             Icons:\n\
             ├─ output-dir: {}\n\
             └─ delay-ms: {}",
            self.store.data_path,
            self.store.read_timeout_ms,
            self.store.write_timeout_ms,
            self.store.upload_timeout_ms,
            self.store.user_agent,
            self.store.emit_format_marker,
            self.icons.output_dir,
            self.icons.delay_ms,
        )
    }
}

fn parse_millis(value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(0) => Err(eyre::eyre!("Timeout must be greater than zero")),
        Ok(ms) => Ok(ms),
        Err(_) => Err(eyre::eyre!("Invalid number of milliseconds: {}", value)),
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "catnav") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        // Fallback to current directory if we can't determine project dirs
        PathBuf::from(".catnav").join("config")
    }
}
