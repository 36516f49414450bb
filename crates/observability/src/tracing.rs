//! Subscriber configuration.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: compact human-readable lines on stderr,
/// filtered via `RUST_LOG` (default `info`).
///
/// Stderr keeps logs out of the CLI's stdout, which scripts may parse.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_ok()
    {
        tracing::debug!("tracing initialized");
    }
}
