//! Configuration management.

use crate::error::{HerogateError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the most recent build is located for builder logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderSource {
    /// Most recent entry of the build project's build list.
    #[default]
    Builds,
    /// `Build` stage of the most recent pipeline execution (legacy).
    Pipeline,
}

/// Persistent configuration for Herogate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: String,
    pub log_level: String,
    pub progress_interval_secs: u64,
    pub tail_interval_secs: u64,
    pub stack_poll_interval_secs: u64,
    pub stack_timeout_minutes: u64,
    pub wait_timeout_secs: u64,
    pub log_lines: usize,
    pub builder_source: BuilderSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            log_level: "info".to_string(),
            progress_interval_secs: 10,
            tail_interval_secs: 5,
            stack_poll_interval_secs: 15,
            stack_timeout_minutes: 10,
            wait_timeout_secs: 60 * 60,
            log_lines: 100,
            builder_source: BuilderSource::Builds,
        }
    }
}

impl Config {
    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        paths::config_path()
    }

    /// Load configuration from disk.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific file. A missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| HerogateError::InvalidConfig {
            reason: format!("Failed to read config: {}", e),
        })?;
        serde_json::from_str(&content).map_err(|e| HerogateError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific file, creating its directory.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HerogateError::IoError { path: parent.to_path_buf(), source: e })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| HerogateError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content)
            .map_err(|e| HerogateError::IoError { path: path.to_path_buf(), source: e })
    }
}
