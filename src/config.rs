//! Server configuration
//!
//! Listen address and status vocabulary, read once at startup from an
//! optional TOML file. Missing keys fall back to the defaults.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 2323
//! statuses = ["online", "away", "busy", "offline"]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::types::StatusList;

/// Default listen host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Allowed statuses; the first one is assigned on join
    pub statuses: StatusList,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            statuses: StatusList::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or use the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Address to bind, as `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.statuses.is_empty() {
            return Err(AppError::InvalidConfig(
                "statuses must contain at least one value".to_string(),
            ));
        }
        if self.statuses.as_slice().iter().any(|s| s.trim().is_empty()) {
            return Err(AppError::InvalidConfig(
                "statuses must not contain blank values".to_string(),
            ));
        }
        Ok(())
    }
}
