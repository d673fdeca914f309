//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process at the default `info` level.
///
/// Calling it again is a no-op.
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with an explicit fallback filter; `RUST_LOG` wins when
/// set.
pub fn init_with_filter(fallback: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Timestamped JSON lines; RUST_LOG overrides the fallback filter.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
