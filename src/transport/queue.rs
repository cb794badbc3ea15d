//! # Interrupt-Safe Receive Queue
//!
//! Bounded circular buffer of fixed-size [`Frame`] slots that decouples
//! interrupt-time frame arrival from application-time consumption.
//!
//! ## Discipline
//!
//! The queue is split once into an [`RxProducer`] (interrupt context) and an
//! [`RxConsumer`] (polling context). Neither half is `Clone`, and every
//! mutating operation takes `&mut self`, so there is exactly one producer and
//! one consumer for the lifetime of the queue.
//!
//! - `tail` is written only by the producer, `head` only by the consumer.
//! - `count` is the hand-off point: the producer increments it with release
//!   ordering after the slot is fully written, the consumer decrements it with
//!   release ordering after the slot is fully copied out.
//! - The lost-frame counter is written only by the producer.
//!
//! No lock is taken on either side and nothing allocates after
//! [`ReceiveQueue::with_capacity`].
//!
//! ## Overflow policy
//!
//! When the queue is full the **newest** frame is dropped and the lost-frame
//! counter is incremented, saturating at 255. Buffered frames are preserved
//! and keep their FIFO order.
//!
//! ## Usage
//!
//! ```rust
//! use rfm69_transport::transport::{Frame, ReceiveQueue};
//!
//! let (mut producer, mut consumer) = ReceiveQueue::with_capacity(4).unwrap().split();
//! assert!(producer.try_enqueue(&Frame::new(b"ping").unwrap()));
//! assert_eq!(consumer.try_dequeue().unwrap().as_bytes(), b"ping");
//! assert!(consumer.try_dequeue().is_none());
//! ```

use crate::constants::{LOST_FRAMES_MAX, MAX_FRAME_LEN};
use crate::error::TransportError;
use crate::transport::frame::Frame;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared {
    slots: Box<[UnsafeCell<Frame>]>,
    /// Next slot to read. Consumer-owned.
    head: AtomicUsize,
    /// Next slot to write. Producer-owned.
    tail: AtomicUsize,
    /// Published frames.
    count: AtomicUsize,
    lost: AtomicU8,
}

// SAFETY: a slot is only written by the single producer while it is outside
// the published range (`count` excludes it), and only read by the single
// consumer while inside it. The acquire/release pair on `count` orders the
// slot contents with the hand-off.
unsafe impl Sync for Shared {}

impl Shared {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    fn lost(&self) -> u8 {
        self.lost.load(Ordering::Relaxed)
    }
}

/// Fixed-capacity receive queue, prior to being split into its two halves.
pub struct ReceiveQueue {
    shared: Arc<Shared>,
}

impl ReceiveQueue {
    /// Allocate a queue with `capacity` frame slots.
    ///
    /// This is the only allocation the queue ever performs.
    ///
    /// # Returns
    /// * `Ok(ReceiveQueue)` - queue ready to be split
    /// * `Err(TransportError::InvalidConfig)` - `capacity` is zero
    pub fn with_capacity(capacity: usize) -> Result<Self, TransportError> {
        if capacity == 0 {
            return Err(TransportError::InvalidConfig(
                "receive queue capacity must be at least 1".to_string(),
            ));
        }

        let slots: Box<[UnsafeCell<Frame>]> =
            (0..capacity).map(|_| UnsafeCell::new(Frame::EMPTY)).collect();

        Ok(Self {
            shared: Arc::new(Shared {
                slots,
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                count: AtomicUsize::new(0),
                lost: AtomicU8::new(0),
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Split into the interrupt-side producer and the polling-side consumer.
    pub fn split(self) -> (RxProducer, RxConsumer) {
        (
            RxProducer {
                shared: Arc::clone(&self.shared),
            },
            RxConsumer {
                shared: self.shared,
            },
        )
    }
}

/// Producer half, owned by the interrupt handler.
///
/// Never blocks, never allocates, never logs.
pub struct RxProducer {
    shared: Arc<Shared>,
}

impl RxProducer {
    /// Copy `frame` into the next free slot.
    ///
    /// Returns `false` when the queue is full; the frame is dropped and the
    /// lost-frame counter is incremented. The caller remains responsible for
    /// clearing the radio's receive-complete condition.
    pub fn try_enqueue(&mut self, frame: &Frame) -> bool {
        self.try_enqueue_with(|buf| {
            buf[..frame.len()].copy_from_slice(frame.as_bytes());
            frame.len()
        })
    }

    /// Let `fill` write the next frame straight into the free slot.
    ///
    /// `fill` receives the slot payload buffer and returns the number of bytes
    /// written (clamped to `MAX_FRAME_LEN`). It is not called when the queue
    /// is full.
    pub fn try_enqueue_with<F>(&mut self, fill: F) -> bool
    where
        F: FnOnce(&mut [u8; MAX_FRAME_LEN]) -> usize,
    {
        let shared = &*self.shared;
        let capacity = shared.capacity();

        if shared.count.load(Ordering::Acquire) >= capacity {
            self.record_lost();
            return false;
        }

        let tail = shared.tail.load(Ordering::Relaxed);
        // SAFETY: `tail` is outside the published range, so the consumer does
        // not touch this slot until `count` is incremented below.
        let slot = unsafe { &mut *shared.slots[tail].get() };
        slot.fill_with(fill);

        shared
            .tail
            .store((tail + 1) % capacity, Ordering::Relaxed);
        shared.count.fetch_add(1, Ordering::Release);
        true
    }

    /// Count one discarded frame, clamping at 255.
    fn record_lost(&self) {
        let lost = self.shared.lost.load(Ordering::Relaxed);
        if lost < LOST_FRAMES_MAX {
            self.shared.lost.store(lost + 1, Ordering::Relaxed);
        }
    }

    pub fn is_full(&self) -> bool {
        self.shared.len() >= self.shared.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn lost_frames(&self) -> u8 {
        self.shared.lost()
    }
}

/// Consumer half, owned by the polling-context transport.
pub struct RxConsumer {
    shared: Arc<Shared>,
}

impl RxConsumer {
    /// Copy out the oldest frame and free its slot.
    pub fn try_dequeue(&mut self) -> Option<Frame> {
        let shared = &*self.shared;

        if shared.count.load(Ordering::Acquire) == 0 {
            return None;
        }

        let head = shared.head.load(Ordering::Relaxed);
        // SAFETY: `head` is inside the published range; the producer will not
        // reuse this slot until `count` is decremented below.
        let frame = unsafe { *shared.slots[head].get() };

        shared
            .head
            .store((head + 1) % shared.capacity(), Ordering::Relaxed);
        shared.count.fetch_sub(1, Ordering::Release);
        Some(frame)
    }

    /// Snapshot; may race benignly with the producer.
    pub fn is_empty(&self) -> bool {
        self.shared.len() == 0
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Frames dropped on overflow since construction, saturating at 255.
    pub fn lost_frames(&self) -> u8 {
        self.shared.lost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> Frame {
        Frame::new(&[tag; 4]).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ReceiveQueue::with_capacity(0),
            Err(TransportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_enqueue_dequeue_fifo() {
        let (mut tx, mut rx) = ReceiveQueue::with_capacity(3).unwrap().split();

        assert!(rx.is_empty());
        assert!(tx.try_enqueue(&frame(1)));
        assert!(tx.try_enqueue(&frame(2)));
        assert_eq!(rx.len(), 2);

        assert_eq!(rx.try_dequeue(), Some(frame(1)));
        assert_eq!(rx.try_dequeue(), Some(frame(2)));
        assert_eq!(rx.try_dequeue(), None);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (mut tx, mut rx) = ReceiveQueue::with_capacity(2).unwrap().split();

        assert!(tx.try_enqueue(&frame(1)));
        assert!(tx.try_enqueue(&frame(2)));
        assert!(tx.is_full());
        assert!(!tx.try_enqueue(&frame(3)));
        assert_eq!(rx.lost_frames(), 1);
        assert_eq!(rx.len(), 2);

        assert_eq!(rx.try_dequeue(), Some(frame(1)));
        assert_eq!(rx.try_dequeue(), Some(frame(2)));
    }

    #[test]
    fn test_fill_not_called_when_full() {
        let (mut tx, _rx) = ReceiveQueue::with_capacity(1).unwrap().split();
        assert!(tx.try_enqueue(&frame(1)));

        let mut called = false;
        assert!(!tx.try_enqueue_with(|_| {
            called = true;
            0
        }));
        assert!(!called);
        assert_eq!(tx.lost_frames(), 1);
    }

    #[test]
    fn test_indices_wrap() {
        let (mut tx, mut rx) = ReceiveQueue::with_capacity(2).unwrap().split();
        for i in 0..10u8 {
            assert!(tx.try_enqueue(&frame(i)));
            assert_eq!(rx.try_dequeue(), Some(frame(i)));
        }
        assert!(rx.is_empty());
    }
}
