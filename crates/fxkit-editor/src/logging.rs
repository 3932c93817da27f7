//! Logging setup

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info";

/// Install the global `tracing` subscriber, writing to stderr
///
/// `RUST_LOG` overrides the default `info` filter. Later calls, or calls
/// after another subscriber was installed, do nothing.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("Logging initialised");
    }
}
