//! Configuration file
//!
//! JSON document; every field is optional:
//!
//! ```json
//! {
//!   "data_dir": "./gridstore_data",
//!   "log_level": "info",
//!   "http": { "host": "0.0.0.0", "port": 5001, "cors_origins": [] }
//! }
//! ```
//!
//! A missing file yields the defaults. A present but invalid file is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for dataset units
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP listener settings
    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_data_dir() -> String {
    "./gridstore_data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            http: HttpServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CliError::config_error(format!(
                    "Failed to read config {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        if self.http.max_upload_bytes == 0 {
            return Err(CliError::config_error("http.max_upload_bytes must be > 0"));
        }

        Ok(())
    }

    /// Get data directory as a path
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}
