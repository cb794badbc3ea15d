//! # Radio Driver Capability Traits
//!
//! This module defines the boundary between the transport and the
//! register-level RFM69 driver. The shared request/response capability set is
//! [`RadioDriver`]; the two structurally different driver flavours extend it:
//!
//! - [`BufferedDriver`]: raises an interrupt on payload-ready / packet-sent and
//!   hands the registered [`RxInterruptHandler`] an [`IrqContext`] to decode
//!   the frame from interrupt context.
//! - [`PollingDriver`]: keeps the last received frame in the driver and is
//!   polled from the application loop.
//!
//! Register access, modulation, CRC and the retry/ACK algorithm live behind
//! these traits and are not implemented by this crate (see `radio::sim` for
//! an in-process stand-in).

use crate::constants::{
    DEFAULT_RETRIES, DEFAULT_RETRY_TIMEOUT_MS, INVALID_LEVEL, INVALID_PERCENT, INVALID_RSSI,
};
use crate::error::TransportError;
use crate::transport::irq::RxInterruptHandler;
use crate::transport::keys::AesKey;
use bitflags::bitflags;

bitflags! {
    /// Interrupt status reported by the chip (REG_IRQFLAGS2 subset)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqFlags: u8 {
        const CRC_OK = 0x02;
        const PAYLOAD_READY = 0x04;
        const PACKET_SENT = 0x08;
    }
}

/// Parameters for driver bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSettings {
    pub frequency_hz: u32,
    pub network_id: u8,
    /// RFM69HW/HCW high-power amplifier fitted
    pub high_power: bool,
}

/// Retry parameters handed to the driver's reliable-send primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u8,
    pub retry_timeout_ms: u16,
}

impl RetryPolicy {
    /// Single attempt, no wait for an ACK.
    pub const NO_RETRY: RetryPolicy = RetryPolicy {
        retries: 0,
        retry_timeout_ms: 0,
    };

    pub fn new(retries: u8, retry_timeout_ms: u16) -> Self {
        Self {
            retries,
            retry_timeout_ms,
        }
    }

    pub fn waits_for_ack(&self) -> bool {
        self.retry_timeout_ms > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, DEFAULT_RETRY_TIMEOUT_MS)
    }
}

/// Request/response capability set shared by both driver flavours.
///
/// Telemetry and power-level methods have defaults that report the quantity
/// as not measurable or the request as unsupported.
pub trait RadioDriver {
    /// Bring up the chip with `settings`.
    fn initialise(&mut self, settings: &RadioSettings) -> Result<(), TransportError>;

    fn set_address(&mut self, address: u8);

    fn address(&self) -> u8;

    /// Send `data` to `to`, retrying per `policy`.
    ///
    /// Blocks until an ACK arrives or the retries are exhausted. With
    /// [`RetryPolicy::NO_RETRY`] the frame is sent once without waiting.
    fn send_with_retry(&mut self, to: u8, data: &[u8], policy: RetryPolicy) -> bool;

    fn sleep(&mut self) -> bool;

    fn stand_by(&mut self) -> bool;

    fn power_down(&mut self) -> bool;

    fn power_up(&mut self) -> bool;

    /// Put the chip back into receive mode after standby.
    fn start_receive(&mut self) -> bool;

    /// Read back configuration registers and confirm they are consistent.
    fn sanity_check(&mut self) -> bool;

    /// Service pending driver work from the polling context.
    fn poll(&mut self) {}

    fn sending_rssi(&self) -> i16 {
        INVALID_RSSI
    }

    fn receiving_rssi(&self) -> i16 {
        INVALID_RSSI
    }

    fn tx_power_percent(&self) -> i16 {
        INVALID_PERCENT
    }

    fn tx_power_level(&self) -> i16 {
        INVALID_LEVEL
    }

    fn set_tx_power_level(&mut self, _level: u8) -> bool {
        false
    }

    fn set_tx_power_percent(&mut self, _percent: u8) -> bool {
        false
    }

    /// Enable or disable automatic transmit-power control toward `target_rssi_dbm`.
    fn set_atc(&mut self, _enabled: bool, _target_rssi_dbm: i16) {}

    /// Load an AES key into the chip and enable encryption.
    fn install_key(&mut self, key: &AesKey);
}

/// Interrupt-side view of the chip, valid only for the duration of one
/// [`RxInterruptHandler::on_interrupt`] call.
pub trait IrqContext {
    /// Read and acknowledge the interrupt status.
    fn service(&mut self) -> IrqFlags;

    /// Read the received payload into `buf` and clear the receive-complete
    /// condition. A `None` buffer discards the payload but still clears it.
    ///
    /// Returns the payload length.
    fn read_message(&mut self, buf: Option<&mut [u8]>) -> usize;

    /// Switch the chip back to receive mode.
    fn enter_receive(&mut self);
}

/// Driver that buffers frames through an interrupt callback.
pub trait BufferedDriver: RadioDriver {
    /// Register the single interrupt callback, replacing any previous one.
    fn register_interrupt(&mut self, handler: RxInterruptHandler);
}

/// Driver polled synchronously for received frames.
pub trait PollingDriver: RadioDriver {
    /// Check whether a complete frame is waiting; re-arms receive otherwise.
    fn receive_done(&mut self) -> bool;

    /// Payload of the last received frame.
    fn received(&self) -> &[u8];

    /// Whether the sender of the last frame asked for an ACK.
    fn ack_requested(&self) -> bool;

    fn send_ack(&mut self);

    /// RSSI of the last received frame in dBm
    fn last_rssi(&self) -> i16;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, DEFAULT_RETRIES);
        assert_eq!(policy.retry_timeout_ms, DEFAULT_RETRY_TIMEOUT_MS);
        assert!(policy.waits_for_ack());
        assert!(!RetryPolicy::NO_RETRY.waits_for_ack());
    }

    #[test]
    fn test_irq_flags() {
        let flags = IrqFlags::from_bits_truncate(0x06);
        assert!(flags.contains(IrqFlags::PAYLOAD_READY));
        assert!(flags.contains(IrqFlags::CRC_OK));
        assert!(!flags.contains(IrqFlags::PACKET_SENT));
    }
}
