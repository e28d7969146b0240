//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the level passed on the command line.
//! Logs go to stderr so the report on stdout stays machine-readable.

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur during logging initialization
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Console log encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Parse a level name into a directive accepted by `EnvFilter`
fn level_directive(level: &str) -> Result<&'static str, LoggingError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" => Ok("warn"),
        "error" => Ok("error"),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}

/// Install the global subscriber
pub fn init_subscriber(level: &str, format: LogFormat) -> Result<(), LoggingError> {
    let directive = level_directive(level)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let result = match format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true);
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer),
            )
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true);
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer),
            )
        }
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(level_directive("INFO").unwrap(), "info");
        assert_eq!(level_directive("warn").unwrap(), "warn");
        assert!(matches!(
            level_directive("loud"),
            Err(LoggingError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_invalid_level_rejected_before_install() {
        assert!(init_subscriber("verbose", LogFormat::Text).is_err());
    }
}
