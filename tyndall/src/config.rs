//! Application configuration
//!
//! Window setup, the scene to open with, its initial inputs and an optional seed. Stored as
//! JSON; every field is optional in the file and falls back to its default.

use crate::scenes::{SceneKind, SceneParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub scene: SceneKind,
    pub params: SceneParams,
    /// Seed for reproducible particle fields; random when absent
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Tyndall Effect".to_string(),
            width: 1280,
            height: 720,
            scene: SceneKind::TwoCups,
            params: SceneParams::default(),
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|error| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            error,
        })?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config.validated())
    }

    /// Save configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|error| ConfigError::Serialize { error })?;
        fs::write(path.as_ref(), contents).map_err(|error| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }

    /// Clamp scene inputs and keep the window at least 320×240
    pub fn validated(mut self) -> Self {
        self.params = self.params.clamped();
        if self.width < 320 || self.height < 240 {
            log::warn!("Window {}x{} too small, using at least 320x240", self.width, self.height);
            self.width = self.width.max(320);
            self.height = self.height.max(240);
        }
        self
    }
}

/// Error types for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error when reading or writing configuration files
    Io { path: PathBuf, error: std::io::Error },
    /// JSON parsing error
    Parse { path: PathBuf, error: serde_json::Error },
    /// JSON serialization error
    Serialize { error: serde_json::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, error } => {
                write!(formatter, "Failed to read/write config file '{}': {}", path.display(), error)
            }
            ConfigError::Parse { path, error } => {
                write!(formatter, "Failed to parse config file '{}': {}", path.display(), error)
            }
            ConfigError::Serialize { error } => write!(formatter, "Failed to serialize config: {}", error),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { error, .. } => Some(error),
            ConfigError::Parse { error, .. } => Some(error),
            ConfigError::Serialize { error } => Some(error),
        }
    }
}
