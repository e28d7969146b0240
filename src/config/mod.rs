//! Configuration module for authflow
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation. Every section has defaults,
//! so an empty document (or no file at all) yields a runnable configuration
//! pointed at `http://localhost:8080`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("AUTH_URL", "http://auth:8080");
/// let result = expand_env_vars("${AUTH_URL}/login");
/// assert_eq!(result, "http://auth:8080/login");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENV_VAR: regex_lite::Regex =
            regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}")
                .expect("env var pattern is valid");
    }

    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in ENV_VAR.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Custom deserializer for strings with environment variable expansion.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub preflight: PreflightConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.target.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid base_url '{}': must start with http:// or https://",
                self.target.base_url
            )));
        }

        if self.target.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "target.timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.preflight.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "preflight.timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.preflight.accepted_statuses.is_empty() {
            return Err(ConfigError::ValidationError(
                "preflight.accepted_statuses cannot be empty".into(),
            ));
        }

        if let Some(status) = self
            .preflight
            .accepted_statuses
            .iter()
            .find(|s| !(100..=599).contains(*s))
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid preflight status {}: must be between 100 and 599",
                status
            )));
        }

        let creds = &self.credentials;
        if creds.username_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "credentials.username_prefix cannot be empty".into(),
            ));
        }
        if creds.rename_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "credentials.rename_prefix cannot be empty".into(),
            ));
        }
        if creds.initial_password.is_empty() || creds.new_password.is_empty() {
            return Err(ConfigError::ValidationError(
                "credentials passwords cannot be empty".into(),
            ));
        }
        if creds.initial_password == creds.new_password {
            return Err(ConfigError::ValidationError(
                "credentials.new_password must differ from initial_password".into(),
            ));
        }
        if creds.email_domain.trim().is_empty() || creds.email_domain.contains('@') {
            return Err(ConfigError::ValidationError(format!(
                "Invalid email_domain '{}'",
                creds.email_domain
            )));
        }

        if self.metrics.enabled && self.metrics.output.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "metrics.output cannot be empty when metrics are enabled".into(),
            ));
        }

        Ok(())
    }
}

/// Service under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base address of the authentication service. Supports ${VAR} expansion.
    #[serde(
        default = "default_base_url",
        deserialize_with = "deserialize_with_env"
    )]
    pub base_url: String,

    /// Per-request timeout for lifecycle steps. Default: 30
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Reachability probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightConfig {
    #[serde(default = "default_preflight_timeout")]
    pub timeout_seconds: u64,

    /// Any of these statuses means "something is listening".
    #[serde(default = "default_accepted_statuses")]
    pub accepted_statuses: Vec<u16>,
}

impl PreflightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_preflight_timeout(),
            accepted_statuses: default_accepted_statuses(),
        }
    }
}

fn default_preflight_timeout() -> u64 {
    5
}

fn default_accepted_statuses() -> Vec<u16> {
    vec![200, 201, 400, 401, 403, 405, 409]
}

/// Run pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Pause between consecutive steps. Default: 1000 (1 second)
    #[serde(default = "default_step_delay")]
    pub step_delay_millis: u64,
}

impl RunConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_millis)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_delay_millis: default_step_delay(),
        }
    }
}

fn default_step_delay() -> u64 {
    1000
}

/// Identity material used by the lifecycle steps.
///
/// # Example
///
/// ```yaml
/// credentials:
///   username_prefix: "testuser_"
///   initial_password: "${AUTHFLOW_PASSWORD:-senha123}"
///   new_password: "novaSenha456"
///   email_domain: "example.com"
///   rename_prefix: "updated_"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Prefix of the randomized username seeded at run start.
    #[serde(default = "default_username_prefix")]
    pub username_prefix: String,

    #[serde(
        default = "default_initial_password",
        deserialize_with = "deserialize_with_env"
    )]
    pub initial_password: String,

    #[serde(
        default = "default_new_password",
        deserialize_with = "deserialize_with_env"
    )]
    pub new_password: String,

    #[serde(default = "default_email_domain")]
    pub email_domain: String,

    /// Prepended to the current username by the rename step.
    #[serde(default = "default_rename_prefix")]
    pub rename_prefix: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username_prefix: default_username_prefix(),
            initial_password: default_initial_password(),
            new_password: default_new_password(),
            email_domain: default_email_domain(),
            rename_prefix: default_rename_prefix(),
        }
    }
}

fn default_username_prefix() -> String {
    "testuser_".to_string()
}

fn default_initial_password() -> String {
    "senha123".to_string()
}

fn default_new_password() -> String {
    "novaSenha456".to_string()
}

fn default_email_domain() -> String {
    "example.com".to_string()
}

fn default_rename_prefix() -> String {
    "updated_".to_string()
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Path of the Prometheus text exposition written after the run.
    #[serde(default = "default_metrics_output")]
    pub output: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output: default_metrics_output(),
        }
    }
}

fn default_metrics_output() -> String {
    "authflow.prom".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target.base_url, "http://localhost:8080");
        assert_eq!(config.run.step_delay(), Duration::from_secs(1));
        assert_eq!(
            config.preflight.accepted_statuses,
            vec![200, 201, 400, 401, 403, 405, 409]
        );
    }

    #[test]
    fn test_config_validation_bad_scheme() {
        let mut config = Config::default();
        config.target.base_url = "localhost:8080".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_same_passwords() {
        let mut config = Config::default();
        config.credentials.new_password = config.credentials.initial_password.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_status_out_of_range() {
        let mut config = Config::default();
        config.preflight.accepted_statuses = vec![200, 999];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_with_default() {
        let expanded = expand_env_vars("${AUTHFLOW_SURELY_UNSET_VAR:-fallback}/x");
        assert_eq!(expanded, "fallback/x");
    }

    #[test]
    fn test_expand_keeps_unknown_placeholder() {
        let expanded = expand_env_vars("${AUTHFLOW_SURELY_UNSET_VAR}");
        assert_eq!(expanded, "${AUTHFLOW_SURELY_UNSET_VAR}");
    }
}
