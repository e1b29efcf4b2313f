//! Tracing initialization
//!
//! The embedding binary calls [`init_tracing`] once at startup; the
//! `RUST_LOG` environment variable overrides the configured level.

use tracing_subscriber::EnvFilter;

use photomirror_core::config::LoggingConfig;

/// Installs the global tracing subscriber
///
/// Must be called at most once per process; a second call is ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}
