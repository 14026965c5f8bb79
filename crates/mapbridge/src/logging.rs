//! Log setup for the host binary.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured level.
pub const LOG_ENV: &str = "MAPBRIDGE_LOG";

/// Installs a stderr subscriber. `MAPBRIDGE_LOG` takes precedence over
/// `level`. Returns `false` when a subscriber was already installed.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    // stdout belongs to the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
