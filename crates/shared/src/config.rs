//! Configuration management for the catalog client.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Upstream catalog API settings
    pub catalog: CatalogConfig,

    /// Facet cache pacing
    #[serde(default)]
    pub facets: FacetConfig,

    /// Content policy settings
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Upstream catalog API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Jikan API base URL
    pub base_url: String,

    /// Transport timeout in milliseconds
    pub timeout_ms: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Result ceiling for top/seasonal listings
    pub listing_limit: u32,

    /// Result ceiling for search (kept smaller to bound payload size)
    pub search_limit: u32,

    /// Wait before the single retry after an HTTP 429
    pub rate_limit_backoff_ms: u64,

    /// Shortest free-text query that is sent without structured filters
    pub min_query_chars: usize,
}

/// Per-facet pacing delays applied before the first fetch of a facet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetConfig {
    pub characters_delay_ms: u64,
    pub recommendations_delay_ms: u64,
    pub staff_delay_ms: u64,
    pub videos_delay_ms: u64,
}

/// Content policy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Genre codes blocked in addition to the built-in blocklist.
    /// The built-in codes cannot be removed.
    #[serde(default)]
    pub extra_blocked_genres: Vec<u32>,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            characters_delay_ms: 300,
            recommendations_delay_ms: 500,
            staff_delay_ms: 700,
            videos_delay_ms: 1000,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            timeout_ms: 12_000,
            user_agent: "catalog-client/0.1.0".to_string(),
            listing_limit: 25,
            search_limit: 24,
            rate_limit_backoff_ms: 2_000,
            min_query_chars: 3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: true,
                json_format: false,
            },
            catalog: CatalogConfig::default(),
            facets: FacetConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the absolute path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        let log_path = Path::new(&self.logging.log_dir);
        if log_path.is_absolute() {
            log_path.to_path_buf()
        } else {
            self.data_dir().join(log_path)
        }
    }
}
