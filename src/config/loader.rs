//! Configuration loader with environment variable expansion

use super::{expand_env_vars, Config, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from a file when given, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Config, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: Config = if expanded.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&expanded)?
        };
        config.validate()?;
        Ok(config)
    }
}
