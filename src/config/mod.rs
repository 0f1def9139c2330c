//! Configuration management
//!
//! Layered loading in priority order (highest first):
//! 1. Environment variables (`GENOFLOW__<section>__<key>`)
//! 2. TOML configuration file (default `config/genoflow.toml`,
//!    overridable via `GENOFLOW_CONFIG`)
//! 3. Default values embedded in the structs
//!
//! Secrets never live in the TOML file: the API password arrives through
//! the CLI (or `GENOFLOW_API_PASSWORD`), the SFTP password through
//! `GENOFLOW_SFTP_PASSWORD`.

mod models;
mod sources;

pub use models::{ApiConfig, Config, PollingConfig, SftpConfig};
pub use sources::config_path;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment).
    pub fn load() -> Result<Self, ConfigError> {
        Ok(sources::load()?)
    }

    /// Load configuration from a specific path. Useful for tests.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        Ok(sources::load_from_sources(path)?)
    }

    /// Persist the non-secret surface back to a TOML file (`config set`).
    pub fn store(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
