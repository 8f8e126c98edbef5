//! Tracing subscriber setup for the binary.

use clap::ValueEnum;
use tracing::Subscriber;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Builds the subscriber used by the binary without installing it.
///
/// `RUST_LOG` takes priority over `level`. Logs go to stderr so stdout stays
/// free for reports.
pub fn build_subscriber(level: &str, format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => Box::new(
            registry.with(fmt::layer().with_writer(std::io::stderr).with_target(false)),
        ),
        LogFormat::Json => Box::new(registry.with(fmt::layer().json().with_writer(std::io::stderr))),
    }
}

/// Installs the global tracing subscriber. Calling this twice is a no-op.
pub fn init_tracing(level: &str, format: LogFormat) {
    if tracing::subscriber::set_global_default(build_subscriber(level, format)).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_filters_by_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        tracing::subscriber::with_default(build_subscriber("warn", LogFormat::Text), || {
            assert!(tracing::enabled!(tracing::Level::WARN));
            assert!(!tracing::enabled!(tracing::Level::INFO));
        });
        tracing::subscriber::with_default(build_subscriber("debug", LogFormat::Json), || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
            assert!(!tracing::enabled!(tracing::Level::TRACE));
        });
    }

    #[test]
    fn test_log_format_parses_from_cli_value() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("TEXT", true), Ok(LogFormat::Text));
        assert!(LogFormat::from_str("yaml", true).is_err());
    }
}
