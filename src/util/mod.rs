//! # Utility Modules
//!
//! Common helpers used throughout the transport crate.

pub mod logging;

pub use logging::{log_frame_hex, LogThrottle};
