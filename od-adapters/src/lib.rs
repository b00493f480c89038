// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage adapters for omnidrive
//!
//! The local-disk adapter, drive configuration, and a registry that turns a
//! configuration into named drives.

pub mod config;
mod local;

pub use config::{AdapterConfig, Config, ConfigError, ConfigResult};
pub use local::{LocalAdapter, READ_CHUNK_SIZE};

use od_core::Drive;
use std::collections::BTreeMap;

/// Registry of drives by id
#[derive(Debug, Clone, Default)]
pub struct DriveRegistry {
    drives: BTreeMap<String, Drive>,
    kinds: BTreeMap<String, AdapterConfig>,
}

impl DriveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one drive per configured entry
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let mut registry = Self::new();
        for (id, adapter) in &config.drives {
            config::validate_drive_id(id)?;
            registry.register(Drive::from_arc(id.clone(), adapter.build()));
            registry.kinds.insert(id.clone(), adapter.clone());
        }
        Ok(registry)
    }

    pub fn register(&mut self, drive: Drive) {
        self.drives.insert(drive.id().to_string(), drive);
    }

    pub fn get(&self, id: &str) -> Option<&Drive> {
        self.drives.get(id)
    }

    pub fn get_or_err(&self, id: &str) -> ConfigResult<&Drive> {
        self.get(id).ok_or_else(|| ConfigError::DriveNotFound(id.to_string()))
    }

    /// How a drive was configured, if it came from a config
    pub fn adapter_config(&self, id: &str) -> Option<&AdapterConfig> {
        self.kinds.get(id)
    }

    pub fn list(&self) -> Vec<&str> {
        self.drives.keys().map(|s| s.as_str()).collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<Drive> {
        self.kinds.remove(id);
        self.drives.remove(id)
    }
}
