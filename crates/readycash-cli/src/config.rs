//! Application configuration management.
//!
//! Configuration is stored at `~/.config/readycash/config.json`. Any field can
//! be overridden from the environment (a `.env` file is honoured), which is how
//! secrets are usually supplied in scripted use.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "readycash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the cache dir holding cached sessions
const SESSIONS_DIR: &str = "sessions";

const DEFAULT_SESSION_LENGTH_SECS: u64 = 3600;

pub const ENV_BASE_URL: &str = "READYCASH_BASE_URL";
pub const ENV_USERNAME: &str = "READYCASH_USERNAME";
pub const ENV_PASSWORD: &str = "READYCASH_PASSWORD";
pub const ENV_PIN: &str = "READYCASH_PIN";

fn default_session_length() -> u64 {
    DEFAULT_SESSION_LENGTH_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub username: Option<String>,
    #[serde(default = "default_session_length")]
    pub session_length_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            session_length_secs: DEFAULT_SESSION_LENGTH_SECS,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(user) = non_empty(ENV_USERNAME) {
            self.username = Some(user);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory backing the on-disk session store.
    pub fn sessions_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(SESSIONS_DIR))
    }

    pub fn session_length(&self) -> Duration {
        Duration::from_secs(self.session_length_secs)
    }

    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No gateway URL configured; set {} or base_url in config.json", ENV_BASE_URL)
        })
    }
}
