//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Default backend origin, matching the backend's development port
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Backend to test against
    #[serde(default)]
    pub target: TargetConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Backend target settings
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    /// Origin of the backend, e.g. `http://localhost:3000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    /// Timeout for a whole request, response body included.
    /// Chat requests wait on AI generation, so this stays generous.
    #[serde(default = "default_request")]
    pub request_secs: u64,

    /// Timeout for establishing the TCP connection
    #[serde(default = "default_connect")]
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
            connect_secs: default_connect(),
        }
    }
}

fn default_request() -> u64 {
    30
}
fn default_connect() -> u64 {
    5
}

/// Report output configuration
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Emit the report as JSON instead of console narration
    #[serde(default)]
    pub json: bool,

    /// Print request lines and response bodies for each step
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
