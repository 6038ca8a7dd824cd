//! Process-wide tracing setup shared by the server binary and tests.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize tracing with JSON output and `RUST_LOG` filtering (default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
