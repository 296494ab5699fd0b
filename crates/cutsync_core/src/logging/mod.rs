//! Logging setup for cutsync.
//!
//! Reconciliation code logs through the `tracing` macros; applications
//! embedding the engine install a subscriber once with [`init_tracing`].
//!
//! # Example
//!
//! ```no_run
//! use cutsync_core::logging::{init_tracing, LogLevel};
//!
//! init_tracing(LogLevel::Debug);
//! tracing::info!("Reconciling cut {}", "reel_1");
//! ```

mod types;

pub use types::LogLevel;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the process-wide subscriber, filtered by `RUST_LOG` or else by
/// `default_level`. Panics if a global subscriber is already set.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Warning-level subscriber for unit tests; safe to call repeatedly.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_strings_match_env_filter_syntax() {
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert!(EnvFilter::try_new(LogLevel::Trace.as_filter_str()).is_ok());
    }

    #[test]
    fn test_tracing_can_be_initialized_twice() {
        init_test_tracing();
        init_test_tracing();
        tracing::warn!("test subscriber installed");
    }
}
