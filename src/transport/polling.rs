//! # Synchronous-Poll Transport
//!
//! Transport variant for drivers without interrupt support. Received frames
//! stay inside the driver until `receive()` copies them out, so
//! `available()` performs driver I/O and at most one frame is pending at a
//! time. ACK replies are sent from the receive path when the peer asked for
//! one.

use crate::config::TransportConfig;
use crate::constants::{INVALID_LEVEL, INVALID_PERCENT, INVALID_RSSI, INVALID_SNR, MAX_FRAME_LEN};
use crate::error::TransportError;
use crate::radio::driver::PollingDriver;
use crate::radio::mode::{ModeController, ModeEvent, RadioMode};
use crate::transport::keys::KeyStore;
use crate::transport::{
    configure_radio, dispatch_send, enter_receiving, request_power, Transport,
};
use crate::util::logging::log_frame_hex;

pub struct PollingTransport<D: PollingDriver> {
    driver: D,
    config: TransportConfig,
    modes: ModeController,
    key_store: Option<Box<dyn KeyStore>>,
    /// Node address, re-applied after every bring-up
    address: Option<u8>,
    /// A frame reported by `available()` that has not been read yet
    pending: bool,
}

impl<D: PollingDriver> PollingTransport<D> {
    pub fn new(driver: D, config: TransportConfig) -> Result<Self, TransportError> {
        config.validate()?;
        Ok(Self {
            driver,
            config,
            modes: ModeController::new(),
            key_store: None,
            address: None,
            pending: false,
        })
    }

    /// Attach persisted key storage for `KeySource::Stored`.
    pub fn with_key_store(mut self, store: impl KeyStore + 'static) -> Self {
        self.key_store = Some(Box::new(store));
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn bring_up(&mut self) -> Result<(), TransportError> {
        self.driver.initialise(&self.config.radio_settings())?;
        // ATC needs the interrupt-driven ACK path; not available here
        configure_radio(
            &mut self.driver,
            &self.config,
            self.key_store.as_deref_mut(),
            false,
        )?;
        if let Some(address) = self.address {
            self.driver.set_address(address);
        }
        self.pending = false;
        enter_receiving(&self.modes)
    }
}

impl<D: PollingDriver> Transport for PollingTransport<D> {
    fn init(&mut self) -> bool {
        match self.bring_up() {
            Ok(()) => {
                log::info!(
                    "RFM69 transport up at {} Hz (polling)",
                    self.config.frequency_hz
                );
                true
            }
            Err(e) => {
                log::error!("RFM69 transport init failed: {e}");
                false
            }
        }
    }

    fn set_address(&mut self, address: u8) {
        self.address = Some(address);
        self.driver.set_address(address);
    }

    fn address(&self) -> u8 {
        self.address.unwrap_or_else(|| self.driver.address())
    }

    fn send(&mut self, to: u8, data: &[u8], no_ack: bool) -> bool {
        let policy = self.config.retry_policy();
        dispatch_send(&mut self.driver, &self.modes, policy, to, data, no_ack)
    }

    fn available(&mut self) -> bool {
        if !self.pending {
            self.pending = self.driver.receive_done();
        }
        self.pending
    }

    fn sanity_check(&mut self) -> bool {
        let healthy = self.driver.sanity_check();
        if !healthy {
            log::warn!("RFM69 sanity check failed");
        }
        healthy
    }

    fn receive(&mut self, buf: &mut [u8]) -> usize {
        if !self.pending && !self.driver.receive_done() {
            return 0;
        }
        self.pending = false;

        let payload = self.driver.received();
        let len = payload.len().min(MAX_FRAME_LEN).min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        log_frame_hex("RX", &buf[..len]);

        if self.driver.ack_requested() {
            self.driver.send_ack();
            log::trace!("ACK sent");
        }
        len
    }

    fn sleep(&mut self) -> bool {
        request_power(&mut self.driver, &self.modes, ModeEvent::SleepRequested, |d| d.sleep())
    }

    fn stand_by(&mut self) -> bool {
        request_power(&mut self.driver, &self.modes, ModeEvent::StandbyRequested, |d| d.stand_by())
    }

    fn power_down(&mut self) -> bool {
        request_power(&mut self.driver, &self.modes, ModeEvent::PowerDownRequested, |d| d.power_down())
    }

    fn power_up(&mut self) -> bool {
        request_power(&mut self.driver, &self.modes, ModeEvent::PowerUpRequested, |d| d.power_up())
    }

    fn resume(&mut self) -> bool {
        request_power(&mut self.driver, &self.modes, ModeEvent::DriverReady, |d| {
            d.start_receive()
        })
    }

    fn set_tx_power_level(&mut self, level: u8) -> bool {
        log::debug!("TX power level {level} not supported by polling driver");
        false
    }

    fn set_tx_power_percent(&mut self, percent: u8) -> bool {
        log::debug!("TX power {percent}% not supported by polling driver");
        false
    }

    fn set_target_rssi(&mut self, _target_dbm: i16) {}

    fn sending_rssi(&self) -> i16 {
        INVALID_RSSI
    }

    fn receiving_rssi(&self) -> i16 {
        self.driver.last_rssi()
    }

    fn sending_snr(&self) -> i16 {
        INVALID_SNR
    }

    fn receiving_snr(&self) -> i16 {
        INVALID_SNR
    }

    fn tx_power_percent(&self) -> i16 {
        INVALID_PERCENT
    }

    fn tx_power_level(&self) -> i16 {
        INVALID_LEVEL
    }

    fn mode(&self) -> RadioMode {
        self.modes.mode()
    }
}
