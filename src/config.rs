//! Configuration for pag-tracker

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TrackerError;

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pag-tracker")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the SQLite database and config file
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Number of projects sampled for phase delay rate and score averages
    #[serde(default = "default_phase_sample_size")]
    pub phase_sample_size: usize,

    /// Trailing months covered by the alert trend, current month included
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,

    /// Entries kept in top sector/province rankings
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8095
}

fn default_phase_sample_size() -> usize {
    10
}

fn default_trend_months() -> u32 {
    6
}

fn default_top_n() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            phase_sample_size: default_phase_sample_size(),
            trend_months: default_trend_months(),
            top_n: default_top_n(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TrackerError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TrackerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get SQLite database path
    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join("tracker.db")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}
