//! # Transport Contract
//!
//! This module defines the [`Transport`] trait consumed by the protocol stack
//! and its two implementations:
//!
//! - [`BufferedTransport`]: frames are decoded from the radio interrupt into a
//!   lock-free [`ReceiveQueue`]; `available()` is an O(1) queue check.
//! - [`PollingTransport`]: frames are polled synchronously from the driver;
//!   `available()` performs driver I/O.
//!
//! Both honour the same contract. The variant is chosen once, when the
//! transport is composed.

pub mod buffered;
pub mod frame;
pub mod irq;
pub mod keys;
pub mod polling;
pub mod queue;

pub use buffered::BufferedTransport;
pub use frame::Frame;
pub use irq::{IrqOutcome, RxInterruptHandler};
pub use keys::{AesKey, FileKeyStore, KeySource, KeyStore, MemoryKeyStore};
pub use polling::PollingTransport;
pub use queue::{ReceiveQueue, RxConsumer, RxProducer};

use crate::config::TransportConfig;
use crate::constants::{MAX_FRAME_LEN, MAX_TX_POWER_LEVEL, MAX_TX_POWER_PERCENT};
use crate::error::TransportError;
use crate::radio::driver::{RadioDriver, RetryPolicy};
use crate::radio::mode::{next_mode, ModeController, ModeEvent, RadioMode};

/// Uniform, driver-agnostic transport contract.
///
/// Every operation reports failure as `false` (or a sentinel for telemetry);
/// nothing here panics.
pub trait Transport {
    /// Bring up the radio and install the receive path.
    ///
    /// Returns `false` if driver bring-up or key provisioning fails; in that
    /// case no receive path is installed and the mode is left untouched.
    fn init(&mut self) -> bool;

    fn set_address(&mut self, address: u8);

    fn address(&self) -> u8;

    /// Send `data` to node `to`.
    ///
    /// With `no_ack` the frame is sent once without waiting and `true` is
    /// returned regardless of the radio outcome. Otherwise blocks until the
    /// retry primitive succeeds or gives up and returns its result.
    fn send(&mut self, to: u8, data: &[u8], no_ack: bool) -> bool;

    /// Whether a received frame is ready for [`receive`](Transport::receive).
    fn available(&mut self) -> bool;

    fn sanity_check(&mut self) -> bool;

    /// Copy one received frame into `buf`. Returns its length, 0 if none.
    fn receive(&mut self, buf: &mut [u8]) -> usize;

    fn sleep(&mut self) -> bool;

    fn stand_by(&mut self) -> bool;

    fn power_down(&mut self) -> bool;

    fn power_up(&mut self) -> bool;

    /// Return from `Standby` to `Receiving` without a full re-init.
    fn resume(&mut self) -> bool;

    /// Set the transmit power level (`0..=23`).
    fn set_tx_power_level(&mut self, level: u8) -> bool;

    /// Set the transmit power as a percentage (`0..=100`).
    fn set_tx_power_percent(&mut self, percent: u8) -> bool;

    /// Retarget automatic transmit-power control. Ignored when ATC is off.
    fn set_target_rssi(&mut self, target_dbm: i16);

    fn sending_rssi(&self) -> i16;

    fn receiving_rssi(&self) -> i16;

    fn sending_snr(&self) -> i16;

    fn receiving_snr(&self) -> i16;

    fn tx_power_percent(&self) -> i16;

    fn tx_power_level(&self) -> i16;

    /// Frames discarded on receive-queue overflow, saturating at 255.
    fn lost_frames(&self) -> u8 {
        0
    }

    fn mode(&self) -> RadioMode;
}

pub(crate) fn tx_power_level_in_range(level: u8) -> bool {
    level <= MAX_TX_POWER_LEVEL
}

pub(crate) fn tx_power_percent_in_range(percent: u8) -> bool {
    percent <= MAX_TX_POWER_PERCENT
}

/// Post-bring-up radio configuration shared by both variants: encryption key
/// (wiped after install) and, when requested, automatic transmit-power control.
pub(crate) fn configure_radio<D: RadioDriver + ?Sized>(
    driver: &mut D,
    config: &TransportConfig,
    key_store: Option<&mut (dyn KeyStore + 'static)>,
    with_atc: bool,
) -> Result<(), TransportError> {
    if let Some(source) = &config.encryption {
        let key = keys::resolve_key(source, key_store)?;
        keys::install_and_wipe(driver, key);
    }
    if with_atc && config.atc_active() {
        driver.set_atc(true, config.atc.target_rssi_dbm);
        log::debug!("ATC enabled, target {} dBm", config.atc.target_rssi_dbm);
    }
    Ok(())
}

/// Move the mode controller into `Receiving` after a successful bring-up,
/// passing through `Standby` when coming out of a low-power state.
pub(crate) fn enter_receiving(modes: &ModeController) -> Result<(), TransportError> {
    if matches!(modes.mode(), RadioMode::Sleeping | RadioMode::PoweredDown) {
        modes.apply(ModeEvent::PowerUpRequested)?;
    }
    modes.apply(ModeEvent::DriverReady)?;
    Ok(())
}

/// Run a power request through the driver, keeping the tracked mode in step.
///
/// A move the transition table rejects never reaches the driver. Otherwise
/// the driver's result is returned unchanged and the mode follows on success.
pub(crate) fn request_power<D: RadioDriver + ?Sized>(
    driver: &mut D,
    modes: &ModeController,
    event: ModeEvent,
    op: impl FnOnce(&mut D) -> bool,
) -> bool {
    let from = modes.mode();
    if next_mode(from, event).is_none() {
        log::warn!("{event:?} refused while {from:?}");
        return false;
    }
    if !op(driver) {
        log::warn!("Driver rejected {event:?}");
        return false;
    }
    if let Err(e) = modes.apply(event) {
        log::warn!("Radio mode not updated: {e}");
    }
    true
}

/// Send path shared by both variants.
///
/// Switches the mode to `Transmitting`, runs the driver's retry primitive and
/// guarantees the mode is `Receiving` again afterwards. A `no_ack` send is
/// fire-and-forget and always reports success.
pub(crate) fn dispatch_send<D: RadioDriver + ?Sized>(
    driver: &mut D,
    modes: &ModeController,
    policy: RetryPolicy,
    to: u8,
    data: &[u8],
    no_ack: bool,
) -> bool {
    if data.len() > MAX_FRAME_LEN {
        log::warn!(
            "Send to {to} rejected: {} bytes exceeds {MAX_FRAME_LEN}",
            data.len()
        );
        return false;
    }

    if let Err(e) = modes.apply(ModeEvent::SendRequested) {
        log::warn!("Send to {to} not dispatched: {e}");
        return no_ack;
    }

    // Drop a latch left over from a completion that raced the previous send
    modes.take_transmission_complete();

    let policy = if no_ack { RetryPolicy::NO_RETRY } else { policy };
    let delivered = driver.send_with_retry(to, data, policy);

    if modes.take_transmission_complete() {
        log::trace!("Completion interrupt re-armed RX after send to {to}");
    } else if modes.finish_transmission() {
        // No completion interrupt arrived; re-arm RX from here
        driver.start_receive();
    }

    if no_ack {
        return true;
    }
    if !delivered {
        log::debug!("Send to {to} failed after {} retries", policy.retries);
    }
    delivered
}
