//! Tracing setup.
//!
//! Logs go to stderr so command output on stdout stays parseable. The filter
//! comes from `RUST_LOG` when set, otherwise from `[logging].level`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global subscriber. Calling it twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
