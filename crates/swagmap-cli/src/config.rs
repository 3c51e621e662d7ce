//! Configuration management for the CLI
//!
//! Configuration is read from the first file found among an explicit
//! `--config` path, the working directory and the user config directory,
//! then environment overrides are applied on top.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use swagmap_core::SpecConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options applied to every loaded document
    pub spec: SpecConfig,

    pub output: OutputConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Show progress indicators while loading large documents
    pub progress: bool,

    /// Use colored output by default
    pub color: bool,
}

/// Logging section of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` flag is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: true,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from a file, picking the parser by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "a .yaml, .json or .toml config file".to_string(),
                })
            }
        };

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable config file");
                    }
                }
            }
        }
        Ok(Self::default())
    }

    /// Load from a specific file or the default locations, then apply
    /// environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.spec = self.spec.with_env_overrides();
        self
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for extension in ["yaml", "json", "toml"] {
            paths.push(PathBuf::from(format!(".swagmap.{extension}")));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let swagmap_dir = config_dir.join("swagmap");
            for extension in ["yaml", "json", "toml"] {
                paths.push(swagmap_dir.join(format!("config.{extension}")));
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".swagmap.yaml"));
        }

        paths
    }
}
