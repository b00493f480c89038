// SPDX-License-Identifier: AGPL-3.0-or-later
//! Drive configuration
//!
//! ```toml
//! log_level = "info"
//!
//! [drives.local]
//! kind = "local"
//! root = "/"
//!
//! [drives.scratch]
//! kind = "memory"
//! ```

use od_core::{Adapter, MemoryAdapter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::local::LocalAdapter;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid drive id: {0:?}")]
    InvalidDriveId(String),

    #[error("Drive not found: {0}")]
    DriveNotFound(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How to build the adapter behind a drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AdapterConfig {
    Local { root: PathBuf },
    Memory,
}

impl AdapterConfig {
    pub fn build(&self) -> Arc<dyn Adapter> {
        match self {
            AdapterConfig::Local { root } => Arc::new(LocalAdapter::new(root)),
            AdapterConfig::Memory => Arc::new(MemoryAdapter::new()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AdapterConfig::Local { .. } => "local",
            AdapterConfig::Memory => "memory",
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub drives: BTreeMap<String, AdapterConfig>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let mut drives = BTreeMap::new();
        drives.insert(
            "local".to_string(),
            AdapterConfig::Local { root: PathBuf::from("/") },
        );
        Self {
            log_level: default_log_level(),
            drives,
        }
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(input)?;
        for id in config.drives.keys() {
            validate_drive_id(id)?;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Per-user config file location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "omnidrive", "omnidrive")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load `explicit` if given, else the per-user file if present, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Drive ids share the `od://<id>/` and `<id>:` address syntax
pub fn validate_drive_id(id: &str) -> ConfigResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidDriveId(id.to_string()))
    }
}
