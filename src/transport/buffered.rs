//! # Interrupt-Buffered Transport
//!
//! Transport variant for drivers that signal received frames by interrupt.
//! On [`init`](Transport::init) the producer half of the receive queue is
//! wrapped in an [`RxInterruptHandler`] and registered with the driver; the
//! consumer half stays here and serves `available()` / `receive()` without
//! touching the radio.

use crate::config::TransportConfig;
use crate::constants::INVALID_SNR;
use crate::error::TransportError;
use crate::radio::driver::BufferedDriver;
use crate::radio::mode::{ModeController, ModeEvent, RadioMode};
use crate::transport::irq::RxInterruptHandler;
use crate::transport::keys::KeyStore;
use crate::transport::queue::{ReceiveQueue, RxConsumer, RxProducer};
use crate::transport::{
    configure_radio, dispatch_send, enter_receiving, request_power,
    tx_power_level_in_range, tx_power_percent_in_range, Transport,
};
use crate::util::logging::{log_frame_hex, LogThrottle};
use std::sync::Arc;

/// Overflow warnings: at most 5 per 10 seconds
const OVERFLOW_LOG_WINDOW_MS: u64 = 10_000;
const OVERFLOW_LOG_CAP: u32 = 5;

pub struct BufferedTransport<D: BufferedDriver> {
    driver: D,
    config: TransportConfig,
    modes: Arc<ModeController>,
    consumer: RxConsumer,
    /// Handed to the interrupt handler on the first successful init
    producer: Option<RxProducer>,
    key_store: Option<Box<dyn KeyStore>>,
    address: u8,
    lost_reported: u8,
    overflow_log: LogThrottle,
}

impl<D: BufferedDriver> BufferedTransport<D> {
    /// Compose the transport around `driver`.
    ///
    /// Allocates the receive queue (`config.rx_buffer_size` slots); nothing
    /// is allocated on the receive path afterwards.
    pub fn new(driver: D, config: TransportConfig) -> Result<Self, TransportError> {
        config.validate()?;
        let (producer, consumer) = ReceiveQueue::with_capacity(config.rx_buffer_size)?.split();

        Ok(Self {
            driver,
            config,
            modes: Arc::new(ModeController::new()),
            consumer,
            producer: Some(producer),
            key_store: None,
            address: 0,
            lost_reported: 0,
            overflow_log: LogThrottle::new(OVERFLOW_LOG_WINDOW_MS, OVERFLOW_LOG_CAP),
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

    /// Frames waiting in the receive queue
    pub fn queued(&self) -> usize {
        self.consumer.len()
    }

    fn bring_up(&mut self) -> Result<(), TransportError> {
        self.driver.initialise(&self.config.radio_settings())?;
        configure_radio(
            &mut self.driver,
            &self.config,
            self.key_store.as_deref_mut(),
            true,
        )?;

        if let Some(producer) = self.producer.take() {
            let handler = RxInterruptHandler::new(producer, Arc::clone(&self.modes));
            self.driver.register_interrupt(handler);
            log::debug!(
                "Receive interrupt installed, queue capacity {}",
                self.consumer.capacity()
            );
        }

        enter_receiving(&self.modes)
    }

    fn report_lost_frames(&mut self) {
        let lost = self.consumer.lost_frames();
        if lost != self.lost_reported {
            let dropped = lost - self.lost_reported;
            self.lost_reported = lost;
            crate::log_warn_throttled!(
                self.overflow_log,
                "Receive queue full: {dropped} frame(s) dropped, {lost} lost in total"
            );
        }
    }
}

impl<D: BufferedDriver> Transport for BufferedTransport<D> {
    fn init(&mut self) -> bool {
        match self.bring_up() {
            Ok(()) => {
                log::info!(
                    "RFM69 transport up at {} Hz (buffered, {} slots)",
                    self.config.frequency_hz,
                    self.consumer.capacity()
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
        self.address = address;
        self.driver.set_address(address);
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn send(&mut self, to: u8, data: &[u8], no_ack: bool) -> bool {
        let policy = self.config.retry_policy();
        dispatch_send(&mut self.driver, &self.modes, policy, to, data, no_ack)
    }

    fn available(&mut self) -> bool {
        self.driver.poll();
        self.report_lost_frames();
        !self.consumer.is_empty()
    }

    fn sanity_check(&mut self) -> bool {
        let healthy = self.driver.sanity_check();
        if !healthy {
            log::warn!("RFM69 sanity check failed");
        }
        healthy
    }

    fn receive(&mut self, buf: &mut [u8]) -> usize {
        match self.consumer.try_dequeue() {
            Some(frame) => {
                log_frame_hex("RX", frame.as_bytes());
                frame.copy_to(buf)
            }
            None => 0,
        }
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
        if !tx_power_level_in_range(level) {
            log::warn!("TX power level {level} out of range");
            return false;
        }
        self.driver.set_tx_power_level(level)
    }

    fn set_tx_power_percent(&mut self, percent: u8) -> bool {
        if !tx_power_percent_in_range(percent) {
            log::warn!("TX power {percent}% out of range");
            return false;
        }
        self.driver.set_tx_power_percent(percent)
    }

    fn set_target_rssi(&mut self, target_dbm: i16) {
        if !self.config.atc_active() {
            log::debug!("ATC inactive, target {target_dbm} dBm ignored");
            return;
        }
        self.config.atc.target_rssi_dbm = target_dbm;
        self.driver.set_atc(true, target_dbm);
    }

    fn sending_rssi(&self) -> i16 {
        self.driver.sending_rssi()
    }

    fn receiving_rssi(&self) -> i16 {
        self.driver.receiving_rssi()
    }

    fn sending_snr(&self) -> i16 {
        INVALID_SNR
    }

    fn receiving_snr(&self) -> i16 {
        INVALID_SNR
    }

    fn tx_power_percent(&self) -> i16 {
        self.driver.tx_power_percent()
    }

    fn tx_power_level(&self) -> i16 {
        self.driver.tx_power_level()
    }

    fn lost_frames(&self) -> u8 {
        self.consumer.lost_frames()
    }

    fn mode(&self) -> RadioMode {
        self.modes.mode()
    }
}
