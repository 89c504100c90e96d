//! Persisted settings in `<config dir>/depaudit/config.toml`.
//!
//! Every key is optional. Command line flags and the `DEPAUDIT_USER` /
//! `DEPAUDIT_TOKEN` environment variables take precedence over the file.
//!
//! ```toml
//! username = "someone@example.com"
//! token = "0123456789abcdef"
//! cache_ttl_hours = 12
//! default_output = "text"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_TTL_HOURS: u64 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OSS Index account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    pub cache_ttl_hours: u64,

    /// One of json, json-pretty, text, csv.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_output: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            token: None,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            default_output: None,
        }
    }
}

impl Config {
    /// Reads the config file; a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config file {}", path.display()))
            }
        };

        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }

    /// ```
    /// assert!(depaudit::Config::config_path().ends_with("depaudit/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depaudit")
            .join("config.toml")
    }

    /// The default settings, plus commented-out credential keys.
    pub fn generate_default_config() -> String {
        let defaults = toml::to_string_pretty(&Config::default()).unwrap_or_default();
        format!(
            "# OSS Index credentials raise the anonymous rate limit\n\
             # username = \"someone@example.com\"\n\
             # token = \"...\"\n\
             {}",
            defaults
        )
    }
}
