//! Tracing/logging setup shared by the binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

/// Initialize process-wide logging.
///
/// Calling it again is a no-op.
pub fn init() {
    tracing::init();
}
