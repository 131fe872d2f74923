//! Indexer configuration with TOML file support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::IndexerError;

/// Configuration for the indexer.
///
/// Can be loaded from a TOML file via [`IndexerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Root directory of both stores.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size of the analytical store, in bytes.
    #[serde(default = "default_map_size")]
    pub analytical_map_size: usize,

    /// LMDB map size of the relational store, in bytes.
    #[serde(default = "default_map_size")]
    pub relational_map_size: usize,

    /// Master block to start from when nothing is indexed yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<u32>,

    /// Delay between polls of the node for new master blocks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// TOML file with the operation schemas used for payload decoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations_file: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tonidx_data")
}

fn default_map_size() -> usize {
    4 * 1024 * 1024 * 1024
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl IndexerConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, IndexerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| IndexerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, IndexerError> {
        toml::from_str(s).map_err(|e| IndexerError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, IndexerError> {
        toml::to_string_pretty(self).map_err(|e| IndexerError::Config(e.to_string()))
    }

    pub fn analytical_path(&self) -> PathBuf {
        self.data_dir.join("analytical")
    }

    pub fn relational_path(&self) -> PathBuf {
        self.data_dir.join("relational")
    }

    pub fn log_format(&self) -> Result<LogFormat, IndexerError> {
        self.log_format.parse()
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            analytical_map_size: default_map_size(),
            relational_map_size: default_map_size(),
            from_block: None,
            poll_interval_ms: default_poll_interval_ms(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            operations_file: None,
        }
    }
}
