//! Transport Constants
//!
//! Limits, defaults and reserved telemetry values shared by the receive
//! queue, the mode controller and both transport variants.

/// Maximum length of a single frame exchanged with the protocol stack.
pub const MAX_FRAME_LEN: usize = 32;

/// Default number of frame slots in the receive queue.
pub const DEFAULT_RX_BUFFER_SIZE: usize = 20;

/// Lost-frame counter ceiling; the counter clamps here instead of wrapping.
pub const LOST_FRAMES_MAX: u8 = u8::MAX;

/// Width of the encryption key block in bytes
pub const AES_KEY_LEN: usize = 16;

// ----------------------------------------------------------------------------
// Radio defaults
// ----------------------------------------------------------------------------

/// 868 MHz band
pub const DEFAULT_FREQUENCY_HZ: u32 = 868_000_000;

/// Network identifier (sync word 2)
pub const DEFAULT_NETWORK_ID: u8 = 100;

/// Automatic transmit-power control target at the peer, in dBm
pub const DEFAULT_ATC_TARGET_RSSI_DBM: i16 = -80;

/// Retries attempted by the driver for acknowledged sends
pub const DEFAULT_RETRIES: u8 = 5;

/// Wait for an ACK before retrying, in milliseconds
pub const DEFAULT_RETRY_TIMEOUT_MS: u16 = 200;

/// Highest accepted transmit power level (levels are `0..=MAX_TX_POWER_LEVEL`)
pub const MAX_TX_POWER_LEVEL: u8 = 23;

/// Highest accepted transmit power percentage
pub const MAX_TX_POWER_PERCENT: u8 = 100;

// ----------------------------------------------------------------------------
// Reserved telemetry values
// ----------------------------------------------------------------------------

pub const INVALID_RSSI: i16 = -256;
pub const INVALID_SNR: i16 = -256;
pub const INVALID_PERCENT: i16 = -100;
pub const INVALID_LEVEL: i16 = -256;
