//! # rfm69-transport - Transport Adaptation Layer for RFM69 Packet Radios
//!
//! This crate sits between a sensor-network protocol stack and an RFM69
//! register-level driver. It gives the stack one uniform transport contract
//! regardless of how the driver delivers frames.
//!
//! ## Features
//!
//! - Lock-free, fixed-capacity receive queue filled from interrupt context
//! - Radio mode state machine shared safely between interrupt and main loop
//! - Interrupt-buffered and synchronous-poll transport variants behind one trait
//! - Encryption key provisioning with wipe-after-install
//! - JSON configuration, `env_logger` based logging and a simulated radio
//!
//! ## Usage
//!
//! ```rust
//! use rfm69_transport::{BufferedTransport, SimRadio, Transport, TransportConfig};
//!
//! let radio = SimRadio::new();
//! let air = radio.handle();
//! let mut transport = BufferedTransport::new(radio, TransportConfig::default()).unwrap();
//! assert!(transport.init());
//!
//! air.inject(b"hello", false, -70);
//! let mut buf = [0u8; 32];
//! assert!(transport.available());
//! assert_eq!(transport.receive(&mut buf), 5);
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod radio;
pub mod transport;
pub mod util;

pub use crate::config::{AtcConfig, DriverVariant, NodeRole, TransportConfig};
pub use crate::error::TransportError;
pub use crate::logging::{init_logger, log_info};

pub use radio::{
    BufferedDriver, ModeController, ModeEvent, PollingDriver, RadioDriver, RadioMode, SimRadio,
    SimRadioHandle,
};
pub use transport::{
    AesKey, BufferedTransport, FileKeyStore, Frame, KeySource, KeyStore, MemoryKeyStore,
    PollingTransport, ReceiveQueue, RxConsumer, RxProducer, Transport,
};

/// Compose a transport for `config.variant` around a simulated radio.
///
/// # Returns
/// * `Ok((transport, handle))` - the transport (not yet initialised) and the
///   air-side handle of its radio
/// * `Err(TransportError::InvalidConfig)` - the configuration was rejected
pub fn simulated_transport(
    config: TransportConfig,
) -> Result<(Box<dyn Transport + Send>, SimRadioHandle), TransportError> {
    let radio = SimRadio::new();
    let handle = radio.handle();
    let transport: Box<dyn Transport + Send> = match config.variant {
        DriverVariant::Buffered => Box::new(BufferedTransport::new(radio, config)?),
        DriverVariant::Polling => Box::new(PollingTransport::new(radio, config)?),
    };
    Ok((transport, handle))
}
