//! Interrupt-context receive path.
//!
//! The [`RxInterruptHandler`] is the only producer for the receive queue. A
//! [`BufferedDriver`](crate::radio::driver::BufferedDriver) invokes it on
//! every radio interrupt. It must not block, allocate, lock or log.

use crate::radio::driver::{IrqContext, IrqFlags};
use crate::radio::mode::{ModeController, RadioMode};
use crate::transport::queue::RxProducer;
use std::sync::Arc;

/// What a single interrupt invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqOutcome {
    /// A frame was decoded into the receive queue
    Queued,
    /// A frame arrived while the queue was full and was discarded
    Dropped,
    /// A transmission finished and the radio was returned to receive
    TransmissionComplete,
    /// Nothing to do (no payload, or radio not in an active mode)
    Ignored,
}

pub struct RxInterruptHandler {
    producer: RxProducer,
    modes: Arc<ModeController>,
}

impl RxInterruptHandler {
    pub fn new(producer: RxProducer, modes: Arc<ModeController>) -> Self {
        Self { producer, modes }
    }

    /// Handle one radio interrupt.
    ///
    /// While transmitting, the interrupt means the packet went out: the mode
    /// is forced back to `Receiving` and the chip re-enters RX. While
    /// receiving, one payload is decoded into the queue, or discarded (with
    /// the receive condition still cleared) when the queue is full.
    pub fn on_interrupt(&mut self, ctx: &mut dyn IrqContext) -> IrqOutcome {
        match self.modes.mode() {
            RadioMode::Transmitting => {
                self.modes.complete_transmission();
                ctx.enter_receive();
                IrqOutcome::TransmissionComplete
            }
            RadioMode::Receiving => {
                if !ctx.service().contains(IrqFlags::PAYLOAD_READY) {
                    return IrqOutcome::Ignored;
                }
                if self
                    .producer
                    .try_enqueue_with(|buf| ctx.read_message(Some(&mut buf[..])))
                {
                    IrqOutcome::Queued
                } else {
                    // Still read the FIFO so the chip is not left stalled
                    ctx.read_message(None);
                    IrqOutcome::Dropped
                }
            }
            _ => IrqOutcome::Ignored,
        }
    }

    pub fn lost_frames(&self) -> u8 {
        self.producer.lost_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::mode::ModeEvent;
    use crate::transport::queue::{ReceiveQueue, RxConsumer};

    /// Chip stand-in holding at most one pending payload
    #[derive(Default)]
    struct FakeChip {
        pending: Option<Vec<u8>>,
        cleared: usize,
        rx_entries: usize,
    }

    impl IrqContext for FakeChip {
        fn service(&mut self) -> IrqFlags {
            if self.pending.is_some() {
                IrqFlags::PAYLOAD_READY | IrqFlags::CRC_OK
            } else {
                IrqFlags::empty()
            }
        }

        fn read_message(&mut self, buf: Option<&mut [u8]>) -> usize {
            self.cleared += 1;
            let payload = self.pending.take().unwrap_or_default();
            if let Some(buf) = buf {
                let n = payload.len().min(buf.len());
                buf[..n].copy_from_slice(&payload[..n]);
            }
            payload.len()
        }

        fn enter_receive(&mut self) {
            self.rx_entries += 1;
        }
    }

    fn handler(capacity: usize) -> (RxInterruptHandler, RxConsumer, Arc<ModeController>) {
        let (producer, consumer) = ReceiveQueue::with_capacity(capacity).unwrap().split();
        let modes = Arc::new(ModeController::new());
        modes.apply(ModeEvent::DriverReady).unwrap();
        (RxInterruptHandler::new(producer, Arc::clone(&modes)), consumer, modes)
    }

    #[test]
    fn test_receive_interrupt_queues_frame() {
        let (mut isr, mut rx, _modes) = handler(2);
        let mut chip = FakeChip {
            pending: Some(vec![1, 2, 3]),
            ..Default::default()
        };

        assert_eq!(isr.on_interrupt(&mut chip), IrqOutcome::Queued);
        assert_eq!(rx.try_dequeue().unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_overflow_still_clears_hardware() {
        let (mut isr, rx, _modes) = handler(1);
        let mut chip = FakeChip::default();

        chip.pending = Some(vec![1]);
        assert_eq!(isr.on_interrupt(&mut chip), IrqOutcome::Queued);
        chip.pending = Some(vec![2]);
        assert_eq!(isr.on_interrupt(&mut chip), IrqOutcome::Dropped);

        assert!(chip.pending.is_none());
        assert_eq!(chip.cleared, 2);
        assert_eq!(rx.lost_frames(), 1);
        assert_eq!(isr.lost_frames(), 1);
    }

    #[test]
    fn test_transmit_interrupt_returns_to_receive() {
        let (mut isr, rx, modes) = handler(1);
        let mut chip = FakeChip::default();

        modes.apply(ModeEvent::SendRequested).unwrap();
        assert_eq!(isr.on_interrupt(&mut chip), IrqOutcome::TransmissionComplete);
        assert_eq!(modes.mode(), RadioMode::Receiving);
        assert!(modes.take_transmission_complete());
        assert_eq!(chip.rx_entries, 1);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_spurious_interrupt_ignored() {
        let (mut isr, rx, modes) = handler(1);
        let mut chip = FakeChip::default();
        assert_eq!(isr.on_interrupt(&mut chip), IrqOutcome::Ignored);

        modes.apply(ModeEvent::SleepRequested).unwrap();
        chip.pending = Some(vec![9]);
        assert_eq!(isr.on_interrupt(&mut chip), IrqOutcome::Ignored);
        assert!(rx.is_empty());
    }
}
