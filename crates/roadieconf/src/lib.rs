//! Minimal configuration loading for Roadie.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, per field):
//! 1. `/etc/roadie/config.toml` (system)
//! 2. `~/.config/roadie/config.toml` (user)
//! 3. `./roadie.toml` (local override, or a CLI-supplied path)
//! 4. Environment variables (`ROADIE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! url = "https://media.example.org"
//!
//! [login]
//! name = "jane"
//! password = "secret"
//!
//! [upload]
//! workflow_id = "fast"
//! series_id = "lecture-series-1"
//! ```
//!
//! # Environment Overrides
//!
//! `ROADIE_SERVER_URL`, `ROADIE_LOGIN_PROVIDED`, `ROADIE_LOGIN_NAME`,
//! `ROADIE_LOGIN_PASSWORD`, `ROADIE_WORKFLOW_ID`, `ROADIE_SERIES_ID`.

pub mod loader;

pub use loader::{discover_config_files, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete Roadie configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadieConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub login: LoginConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

/// Where the media server lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the ingest server.
    pub url: Option<String>,
}

/// How to authenticate. Values are never logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Ambient session cookies already authenticate us; wins over
    /// name/password when set.
    pub provided: Option<bool>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Defaults applied to every upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Workflow definition the server starts after ingest.
    pub workflow_id: Option<String>,
    /// Series new episodes belong to.
    pub series_id: Option<String>,
}

impl RoadieConfig {
    /// Load configuration from all standard sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = loader::load_with_sources(None)?;
        Ok(config)
    }

    /// Load configuration, with an optional CLI-supplied file taking
    /// the place of the local override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = loader::load_with_sources(config_path)?;
        Ok(config)
    }
}
