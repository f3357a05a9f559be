//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{TetherError, TetherResult};

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn build_filter(config: &LoggingConfig) -> TetherResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        TetherError::config_with_context(
            format!("Invalid log level '{}': {}", config.level, e),
            "logging.level",
        )
    })
}

/// Install the global subscriber.
///
/// Fails with a config error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> TetherResult<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| TetherError::config(format!("Failed to initialise logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "tether_core=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(build_filter(&config), Err(TetherError::Config { .. })));
    }

    #[test]
    fn test_second_init_fails_without_panicking() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        };
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
