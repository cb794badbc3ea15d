//! Logger setup for the binary and tests.
//!
//! The crate logs through the `log` facade; `env_logger` is the backend,
//! filtered by `RUST_LOG` (default `info`).

use log::{info, warn};

/// Install the `env_logger` backend.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    init_logger_with("info");
}

/// Install the backend with `default_filter` used when `RUST_LOG` is unset.
pub fn init_logger_with(default_filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    info!("{message}");
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    warn!("{message}");
}
