//! # Transport Error Handling
//!
//! This module defines the `TransportError` enum used on every internal
//! fallible path. The public transport contract flattens these into booleans
//! and sentinel values; the error is logged at the point of conversion.

use crate::radio::mode::{ModeEvent, RadioMode};
use thiserror::Error;

/// Represents the different error types that can occur in the transport crate.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The radio driver failed to come up.
    #[error("Driver initialization failed: {0}")]
    DriverInit(String),

    /// A frame longer than the protocol maximum was offered.
    #[error("Frame too long: {len} bytes (max {max})")]
    FrameTooLong { len: usize, max: usize },

    /// The requested mode change is not in the legal transition set.
    #[error("Illegal mode transition: {event:?} while {from:?}")]
    IllegalTransition { from: RadioMode, event: ModeEvent },

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encryption key material could not be resolved.
    #[error("Key provisioning error: {0}")]
    Key(String),

    /// Indicates an I/O error while reading configuration or key storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indicates malformed JSON configuration.
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}
