//! Configuration file parsing
//!
//! Reads migrate-gen.toml configuration files.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerateConfig {
    /// Dialects every migration must cover; empty disables the check
    #[serde(default)]
    pub dialects: Vec<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for dialect in &self.generate.dialects {
            if !is_valid_dialect(dialect) {
                return Err(ConfigError::Validation(format!(
                    "invalid dialect '{}'. Dialects use lowercase letters and digits only",
                    dialect
                )));
            }
            if !seen.insert(dialect.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "dialect '{}' is listed more than once",
                    dialect
                )));
            }
        }
        Ok(())
    }
}

/// Dialect segments in source filenames match `[a-z0-9]+`.
pub fn is_valid_dialect(dialect: &str) -> bool {
    !dialect.is_empty()
        && dialect
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}
