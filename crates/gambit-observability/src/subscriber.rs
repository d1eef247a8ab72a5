//! Subscriber setup.

use gambit_core::{LogFormat, LoggingConfig};
use thiserror::Error;

use crate::LogLevel;

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// Unknown level name in config.
    #[error("Unknown log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Parse a level name (case-insensitive).
pub fn parse_level(name: &str) -> Result<LogLevel, ObservabilityError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        _ => Err(ObservabilityError::InvalidLevel(name.to_string())),
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Install the global fmt subscriber.
///
/// JSON lines are already self-describing, so the JSON format drops the
/// subscriber's own timestamp, level and target decorations.
pub fn init_tracing(config: &LoggingConfig) -> Result<LogLevel, ObservabilityError> {
    let level = parse_level(&config.level)?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(level))
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Human => builder.with_target(false).try_init(),
        LogFormat::Json => builder
            .without_time()
            .with_level(false)
            .with_target(false)
            .try_init(),
    };

    result.map_err(|e| ObservabilityError::Install(e.to_string()))?;
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO").unwrap(), LogLevel::Info);
        assert_eq!(parse_level(" warning ").unwrap(), LogLevel::Warn);
        assert!(matches!(
            parse_level("loud"),
            Err(ObservabilityError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_level_into_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
    }

    #[test]
    fn test_init_rejects_bad_level() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            ..Default::default()
        };

        assert!(init_tracing(&config).is_err());
    }
}
