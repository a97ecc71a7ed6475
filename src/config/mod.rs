//! Configuration management.
//!
//! All local state lives under `~/.deskctl/`:
//! - `config.json` - user settings (API URL, poll interval, timeouts)
//! - `state.json` - the key/value store (session token, cached user,
//!   preferences)
//!
//! Settings resolve as flag / environment → `config.json` → built-in default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Keys accepted by `deskctl config set`.
pub const CONFIG_KEYS: &[&str] = &["api_url", "poll_interval_secs", "connect_timeout_secs"];

/// Contents of `config.json`. Unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

impl DeskConfig {
    /// Overlay `update` on top of `self`; set fields in `update` win.
    #[must_use]
    pub fn merged_with(self, update: Self) -> Self {
        Self {
            api_url: update.api_url.or(self.api_url),
            poll_interval_secs: update.poll_interval_secs.or(self.poll_interval_secs),
            connect_timeout_secs: update.connect_timeout_secs.or(self.connect_timeout_secs),
        }
    }

    /// Set one key from its textual value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown key or a value of the wrong shape.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(Error::InvalidArgument(format!(
                        "api_url must start with http:// or https://, got '{value}'"
                    )));
                }
                self.api_url = Some(value.trim_end_matches('/').to_string());
            }
            "poll_interval_secs" => self.poll_interval_secs = Some(parse_secs(key, value)?),
            "connect_timeout_secs" => self.connect_timeout_secs = Some(parse_secs(key, value)?),
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown config key '{other}' (expected one of: {})",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Notification poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Connect timeout for the HTTP client; no timeout when unset.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidArgument(format!(
            "{key} must be a positive number of seconds, got '{value}'"
        ))),
    }
}

/// The global deskctl directory: `~/.deskctl/`.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".deskctl"))
}

fn config_path() -> Result<PathBuf> {
    data_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load `~/.deskctl/config.json`, or defaults when it does not exist.
///
/// # Errors
///
/// `Config` when the file cannot be read or parsed.
pub fn load_config() -> Result<DeskConfig> {
    load_config_from(&config_path()?)
}

/// Load a config file from an explicit path.
///
/// # Errors
///
/// `Config` when the file cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<DeskConfig> {
    if !path.exists() {
        return Ok(DeskConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Merge `update` into the stored config and save it.
///
/// # Errors
///
/// `Config` when the file cannot be read or written.
pub fn save_config(update: DeskConfig) -> Result<DeskConfig> {
    save_config_to(&config_path()?, update)
}

/// Merge `update` into the config at `path` and save it (pretty JSON).
///
/// # Errors
///
/// `Config` when the file cannot be read or written.
pub fn save_config_to(path: &Path, update: DeskConfig) -> Result<DeskConfig> {
    let merged = load_config_from(path)?.merged_with(update);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(&merged)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(merged)
}

/// Resolve the backend base URL.
///
/// Priority:
/// 1. `explicit` (the `--api-url` flag or `DESKCTL_API_URL`)
/// 2. `api_url` in `config.json`
/// 3. `http://localhost:8000`
#[must_use]
pub fn resolve_api_url(explicit: Option<&str>, config: &DeskConfig) -> String {
    explicit
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Resolve the key/value store file.
///
/// Priority:
/// 1. `explicit` (the `--store` flag or `DESKCTL_STORE`)
/// 2. `~/.deskctl/state.json`
#[must_use]
pub fn resolve_store_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    data_dir().map(|dir| dir.join("state.json"))
}
