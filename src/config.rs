//! Gateway configuration.
//!
//! Defaults match the stock wallet application: a database named
//! `"wallets"`, held in memory, opened with the ignore-duplicate policy.
//! A TOML file can override any of these:
//!
//! ```toml
//! name = "wallets"
//! ignore_duplicate = true
//! storage = { file = "/var/lib/wallets.db" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Where the database keeps its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    /// Records live as long as the database handle.
    #[default]
    Memory,
    /// Records are persisted to a SQLite file.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Database name; lowercase, starting with a letter.
    pub name: String,
    pub storage: StorageLocation,
    /// Opening a name that is already open in this process shares the
    /// existing instance instead of failing.
    pub ignore_duplicate: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: "wallets".to_string(),
            storage: StorageLocation::Memory,
            ignore_duplicate: true,
        }
    }
}

impl GatewayConfig {
    /// In-memory configuration with a custom database name.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// File-backed configuration with a custom database name.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage: StorageLocation::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_ignore_duplicate(mut self, ignore_duplicate: bool) -> Self {
        self.ignore_duplicate = ignore_duplicate;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s).map_err(ConfigError::from)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
