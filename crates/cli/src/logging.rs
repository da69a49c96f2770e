//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Send `tracing` events to stderr.
///
/// `RUST_LOG` takes precedence over the configured filter.
pub fn init(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
