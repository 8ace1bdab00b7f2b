//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Initialize tracing. Users can install their own subscriber; this helper installs
/// a fmt subscriber filtered by `RUST_LOG` (falling back to `info`) if none is set.
///
/// Thread names are included because every vehicle and the controller run on their
/// own named thread.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
