//! Simulated RFM69 driver for testing
//!
//! [`SimRadio`] implements both driver flavours without hardware. The paired
//! [`SimRadioHandle`] plays the air side: it injects frames (raising the
//! receive interrupt when a handler is registered), scripts driver results
//! and inspects what the transport did to the radio.

use crate::constants::{
    AES_KEY_LEN, INVALID_LEVEL, INVALID_PERCENT, INVALID_RSSI, MAX_FRAME_LEN,
    MAX_TX_POWER_LEVEL, MAX_TX_POWER_PERCENT,
};
use crate::error::TransportError;
use crate::radio::driver::{
    BufferedDriver, IrqContext, IrqFlags, PollingDriver, RadioDriver, RadioSettings, RetryPolicy,
};
use crate::transport::irq::{IrqOutcome, RxInterruptHandler};
use crate::transport::keys::AesKey;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A frame handed to the simulated radio for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub to: u8,
    pub payload: Vec<u8>,
    pub policy: RetryPolicy,
}

/// Driver-level power request seen by the simulated chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOp {
    Sleep,
    StandBy,
    PowerDown,
    PowerUp,
    StartReceive,
}

/// Received frame waiting in the chip FIFO
#[derive(Debug, Clone)]
struct RxFrame {
    payload: Vec<u8>,
    ack_requested: bool,
    rssi: i16,
}

/// Register-level chip state visible from interrupt context
#[derive(Debug, Default)]
struct SimChip {
    fifo: Option<RxFrame>,
    packet_sent: bool,
    last_rssi: Option<i16>,
}

impl IrqContext for SimChip {
    fn service(&mut self) -> IrqFlags {
        let mut flags = IrqFlags::empty();
        if self.fifo.is_some() {
            flags |= IrqFlags::PAYLOAD_READY | IrqFlags::CRC_OK;
        }
        if std::mem::take(&mut self.packet_sent) {
            flags |= IrqFlags::PACKET_SENT;
        }
        flags
    }

    fn read_message(&mut self, buf: Option<&mut [u8]>) -> usize {
        let Some(frame) = self.fifo.take() else {
            return 0;
        };
        self.last_rssi = Some(frame.rssi);
        if let Some(buf) = buf {
            let n = frame.payload.len().min(buf.len());
            buf[..n].copy_from_slice(&frame.payload[..n]);
        }
        frame.payload.len()
    }

    fn enter_receive(&mut self) {}
}

struct SimState {
    chip: SimChip,
    handler: Option<RxInterruptHandler>,
    settings: Option<RadioSettings>,
    address: u8,
    init_error: Option<String>,
    send_result: bool,
    tx_interrupt: bool,
    sanity: bool,
    power_result: bool,
    power_ops: Vec<PowerOp>,
    sent: Vec<SentFrame>,
    acks_sent: usize,
    tx_level: Option<u8>,
    tx_percent: Option<u8>,
    sending_rssi: i16,
    atc: Option<(bool, i16)>,
    installed_key: Option<[u8; AES_KEY_LEN]>,
    irq_log: Vec<IrqOutcome>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            chip: SimChip::default(),
            handler: None,
            settings: None,
            address: 0,
            init_error: None,
            send_result: true,
            tx_interrupt: true,
            sanity: true,
            power_result: true,
            power_ops: Vec::new(),
            sent: Vec::new(),
            acks_sent: 0,
            tx_level: None,
            tx_percent: None,
            sending_rssi: INVALID_RSSI,
            atc: None,
            installed_key: None,
            irq_log: Vec::new(),
        }
    }
}

impl SimState {
    /// Run the registered handler against the chip, as the IRQ line would.
    fn raise_interrupt(&mut self) -> Option<IrqOutcome> {
        let SimState {
            chip,
            handler,
            irq_log,
            ..
        } = self;
        let outcome = handler.as_mut()?.on_interrupt(chip);
        irq_log.push(outcome);
        Some(outcome)
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process RFM69 stand-in
pub struct SimRadio {
    state: Arc<Mutex<SimState>>,
    /// Frame copied out by the last successful `receive_done`
    received: Vec<u8>,
    received_ack: bool,
    received_rssi: i16,
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRadio {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            received: Vec::new(),
            received_ack: false,
            received_rssi: INVALID_RSSI,
        }
    }

    /// Air-side control for this radio
    pub fn handle(&self) -> SimRadioHandle {
        SimRadioHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn power_op(&mut self, op: PowerOp) -> bool {
        let mut state = lock(&self.state);
        state.power_ops.push(op);
        state.power_result
    }
}

impl RadioDriver for SimRadio {
    fn initialise(&mut self, settings: &RadioSettings) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if let Some(reason) = &state.init_error {
            return Err(TransportError::DriverInit(reason.clone()));
        }
        state.settings = Some(*settings);
        log::debug!(
            "Simulated RFM69 at {} Hz, network {}",
            settings.frequency_hz,
            settings.network_id
        );
        Ok(())
    }

    fn set_address(&mut self, address: u8) {
        lock(&self.state).address = address;
    }

    fn address(&self) -> u8 {
        lock(&self.state).address
    }

    fn send_with_retry(&mut self, to: u8, data: &[u8], policy: RetryPolicy) -> bool {
        let mut state = lock(&self.state);
        state.sent.push(SentFrame {
            to,
            payload: data.to_vec(),
            policy,
        });
        if state.tx_interrupt {
            state.chip.packet_sent = true;
            state.raise_interrupt();
        }
        state.send_result
    }

    fn sleep(&mut self) -> bool {
        self.power_op(PowerOp::Sleep)
    }

    fn stand_by(&mut self) -> bool {
        self.power_op(PowerOp::StandBy)
    }

    fn power_down(&mut self) -> bool {
        self.power_op(PowerOp::PowerDown)
    }

    fn power_up(&mut self) -> bool {
        self.power_op(PowerOp::PowerUp)
    }

    fn start_receive(&mut self) -> bool {
        self.power_op(PowerOp::StartReceive)
    }

    fn sanity_check(&mut self) -> bool {
        lock(&self.state).sanity
    }

    fn sending_rssi(&self) -> i16 {
        lock(&self.state).sending_rssi
    }

    fn receiving_rssi(&self) -> i16 {
        lock(&self.state).chip.last_rssi.unwrap_or(INVALID_RSSI)
    }

    fn tx_power_percent(&self) -> i16 {
        lock(&self.state)
            .tx_percent
            .map_or(INVALID_PERCENT, i16::from)
    }

    fn tx_power_level(&self) -> i16 {
        lock(&self.state).tx_level.map_or(INVALID_LEVEL, i16::from)
    }

    fn set_tx_power_level(&mut self, level: u8) -> bool {
        if level > MAX_TX_POWER_LEVEL {
            return false;
        }
        let mut state = lock(&self.state);
        state.tx_level = Some(level);
        state.tx_percent = Some(level_to_percent(level));
        true
    }

    fn set_tx_power_percent(&mut self, percent: u8) -> bool {
        if percent > MAX_TX_POWER_PERCENT {
            return false;
        }
        let mut state = lock(&self.state);
        state.tx_percent = Some(percent);
        state.tx_level = Some(percent_to_level(percent));
        true
    }

    fn set_atc(&mut self, enabled: bool, target_rssi_dbm: i16) {
        lock(&self.state).atc = Some((enabled, target_rssi_dbm));
    }

    fn install_key(&mut self, key: &AesKey) {
        lock(&self.state).installed_key = Some(*key.as_bytes());
    }
}

impl BufferedDriver for SimRadio {
    fn register_interrupt(&mut self, handler: RxInterruptHandler) {
        let mut state = lock(&self.state);
        state.handler = Some(handler);
        // A frame that landed before registration is still latched on the pin
        if state.chip.fifo.is_some() {
            state.raise_interrupt();
        }
    }
}

impl PollingDriver for SimRadio {
    fn receive_done(&mut self) -> bool {
        let mut state = lock(&self.state);
        match state.chip.fifo.take() {
            Some(frame) => {
                state.chip.last_rssi = Some(frame.rssi);
                self.received = frame.payload;
                self.received_ack = frame.ack_requested;
                self.received_rssi = frame.rssi;
                true
            }
            None => false,
        }
    }

    fn received(&self) -> &[u8] {
        &self.received
    }

    fn ack_requested(&self) -> bool {
        self.received_ack
    }

    fn send_ack(&mut self) {
        self.received_ack = false;
        lock(&self.state).acks_sent += 1;
    }

    fn last_rssi(&self) -> i16 {
        self.received_rssi
    }
}

fn level_to_percent(level: u8) -> u8 {
    ((u16::from(level) * u16::from(MAX_TX_POWER_PERCENT)) / u16::from(MAX_TX_POWER_LEVEL)) as u8
}

fn percent_to_level(percent: u8) -> u8 {
    ((u16::from(percent) * u16::from(MAX_TX_POWER_LEVEL)) / u16::from(MAX_TX_POWER_PERCENT)) as u8
}

/// Air-side view of a [`SimRadio`]
#[derive(Clone)]
pub struct SimRadioHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimRadioHandle {
    /// Deliver a frame to the chip.
    ///
    /// Raises the receive interrupt when a handler is registered and returns
    /// what it did; otherwise the frame waits in the FIFO (replacing any
    /// unread one) and `None` is returned. Payloads longer than a frame are
    /// cut at the FIFO limit.
    pub fn inject(&self, payload: &[u8], ack_requested: bool, rssi: i16) -> Option<IrqOutcome> {
        let mut state = lock(&self.state);
        let len = payload.len().min(MAX_FRAME_LEN);
        state.chip.fifo = Some(RxFrame {
            payload: payload[..len].to_vec(),
            ack_requested,
            rssi,
        });
        state.raise_interrupt()
    }

    pub fn fail_init(&self, reason: &str) {
        lock(&self.state).init_error = Some(reason.to_string());
    }

    /// Outcome reported by the retry primitive for subsequent sends
    pub fn set_send_result(&self, delivered: bool) {
        lock(&self.state).send_result = delivered;
    }

    /// Whether a send raises the packet-sent interrupt
    pub fn set_tx_interrupt(&self, enabled: bool) {
        lock(&self.state).tx_interrupt = enabled;
    }

    pub fn set_sanity(&self, healthy: bool) {
        lock(&self.state).sanity = healthy;
    }

    /// Result returned by subsequent power requests
    pub fn set_power_result(&self, ok: bool) {
        lock(&self.state).power_result = ok;
    }

    pub fn set_sending_rssi(&self, rssi: i16) {
        lock(&self.state).sending_rssi = rssi;
    }

    pub fn sent(&self) -> Vec<SentFrame> {
        lock(&self.state).sent.clone()
    }

    pub fn acks_sent(&self) -> usize {
        lock(&self.state).acks_sent
    }

    pub fn power_ops(&self) -> Vec<PowerOp> {
        lock(&self.state).power_ops.clone()
    }

    pub fn settings(&self) -> Option<RadioSettings> {
        lock(&self.state).settings
    }

    pub fn address(&self) -> u8 {
        lock(&self.state).address
    }

    pub fn atc(&self) -> Option<(bool, i16)> {
        lock(&self.state).atc
    }

    pub fn installed_key(&self) -> Option<[u8; AES_KEY_LEN]> {
        lock(&self.state).installed_key
    }

    pub fn has_interrupt_handler(&self) -> bool {
        lock(&self.state).handler.is_some()
    }

    /// Outcomes of every interrupt raised so far
    pub fn interrupts(&self) -> Vec<IrqOutcome> {
        lock(&self.state).irq_log.clone()
    }

    /// Whether an unread frame is still in the chip FIFO
    pub fn fifo_pending(&self) -> bool {
        lock(&self.state).chip.fifo.is_some()
    }
}
