//! Logging setup.
//!
//! The library only emits `tracing` events; binaries call [`init_logging`]
//! once at startup to install a subscriber.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;
use crate::errors::ConfigError;

/// Filter directive used when `RUST_LOG` is unset.
#[must_use]
pub fn default_directive(logs: &LogConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        logs.level.clone()
    }
}

/// Installs a global subscriber writing to stderr and, if configured, to
/// the processor log file.
///
/// `RUST_LOG` overrides the configured level.
pub fn init_logging(logs: &LogConfig, verbose: bool) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(logs, verbose)))
        .map_err(|e| ConfigError::Invalid(format!("log level `{}`: {e}", logs.level)))?;

    let file_layer = match &logs.processor_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("logging already initialised: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_level() {
        let logs = LogConfig::tracing_only();
        assert_eq!(default_directive(&logs, false), "info");
        assert_eq!(default_directive(&logs, true), "debug");
    }
}
