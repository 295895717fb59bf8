//! Log output for front-ends.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber printing to stderr.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`
/// (for example `"info"` or `"doorway_game=debug,info"`). Calling it a
/// second time is a no-op.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
