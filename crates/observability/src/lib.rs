//! Process-wide logging setup.

pub mod logging;

pub use logging::LogFormat;

/// Initialize tracing for the process from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
