use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dispatch::DedupMode;
use crate::model::MachineType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sequencing: SequencingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            sequencing: SequencingConfig::default(),
            dispatch: DispatchConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file for the sqlite backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StorageConfig {
    /// The configured path, or `~/.shopfloor/data/shopfloor.db`.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }
}

/// Which machine classifications chain into each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencingConfig {
    #[serde(default = "default_upstream")]
    pub upstream_machine_type: MachineType,
    #[serde(default = "default_downstream")]
    pub downstream_machine_type: MachineType,
    #[serde(default = "default_dispatch")]
    pub dispatch_machine_type: MachineType,
}

fn default_upstream() -> MachineType {
    MachineType::Forming
}

fn default_downstream() -> MachineType {
    MachineType::PanelAssembly
}

fn default_dispatch() -> MachineType {
    MachineType::Dispatch
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            upstream_machine_type: default_upstream(),
            downstream_machine_type: default_downstream(),
            dispatch_machine_type: default_dispatch(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Sender tag stamped on dispatch messages.
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default)]
    pub dedup: DedupMode,
}

fn default_sender() -> String {
    "SISTEMA".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            dedup: DedupMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}
