//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "tether_scheduler=info";

/// Install a fmt subscriber driven by `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`]. Does nothing if the application already installed one.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

/// Like [`init_tracing`] but writes through the test harness capture, so
/// worker logs show up next to the failing test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("tether_scheduler=debug"))
        .with_thread_names(true)
        .with_test_writer()
        .try_init();
}
