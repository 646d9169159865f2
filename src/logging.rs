//! Logging setup
//!
//! All diagnostics go to stderr through `tracing`; stdout carries only
//! command results.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_str())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Calling this more than once keeps the first subscriber.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(LogLevel::Debug).to_string(), "debug");
        assert_eq!(default_filter(LogLevel::Off).to_string(), "off");
    }

    #[test]
    fn test_init_twice() {
        init(LogLevel::Warn);
        init(LogLevel::Trace);
        tracing::warn!("logging initialized");
    }
}
