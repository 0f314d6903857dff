//! Configuration system for adaptive-fonts.
//!
//! Provides the [`Config`] struct with YAML load/save and the platform paths
//! used for the configuration file and the private font storage area.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API key at load time.
pub const API_KEY_ENV: &str = "ADAPTIVE_FONTS_API_KEY";

/// Google Fonts developer API listing endpoint.
pub const DEFAULT_CATALOG_ENDPOINT: &str = "https://www.googleapis.com/webfonts/v1/webfonts";

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "adaptive-fonts";

/// Process configuration for font resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key sent with catalog requests (`key` query parameter)
    pub api_key: String,
    /// Remote catalog listing endpoint
    pub catalog_endpoint: String,
    /// Private storage area for downloaded fonts and caches.
    /// `None` resolves to the platform local data directory.
    pub storage_dir: Option<PathBuf>,
    /// Global timeout for each HTTP operation, in seconds
    pub http_timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            catalog_endpoint: DEFAULT_CATALOG_ENDPOINT.to_string(),
            storage_dir: None,
            http_timeout_secs: 30,
            user_agent: format!("adaptive-fonts/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catalog API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set an explicit storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Set the catalog endpoint.
    pub fn with_catalog_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.catalog_endpoint = endpoint.into();
        self
    }

    /// Default configuration file path (`~/.config/adaptive-fonts/config.yaml`).
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.yaml")
    }

    /// Storage directory in effect: the configured one, or the platform
    /// local data directory.
    pub fn resolved_storage_dir(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
        }
    }

    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file.
    ///
    /// A missing file yields the defaults; the file is not created.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            log::info!("Loading config from {:?}", path);
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            if contents.trim().is_empty() {
                Self::default()
            } else {
                serde_yaml_ng::from_str(&contents)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            }
        } else {
            log::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let yaml = serde_yaml_ng::to_string(self).context("Failed to serialize config")?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)
            .with_context(|| format!("Failed to write config temp file {:?}", temp_path))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename config temp file to {:?}", path))?;

        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            log::debug!("Using API key from {}", API_KEY_ENV);
            self.api_key = key.trim().to_string();
        }
    }
}
