//! # Radio Mode Tests
//!
//! Transition table and interrupt/polling ownership of the mode controller.

use rfm69_transport::radio::mode::next_mode;
use rfm69_transport::{ModeController, ModeEvent, RadioMode};
use std::sync::{Arc, Barrier};

const ALL_MODES: [RadioMode; 5] = [
    RadioMode::Sleeping,
    RadioMode::PoweredDown,
    RadioMode::Standby,
    RadioMode::Receiving,
    RadioMode::Transmitting,
];

/// Transmitting is only reachable from Receiving
#[test]
fn test_send_only_from_receiving() {
    for mode in ALL_MODES {
        let next = next_mode(mode, ModeEvent::SendRequested);
        if mode == RadioMode::Receiving {
            assert_eq!(next, Some(RadioMode::Transmitting));
        } else {
            assert_eq!(next, None, "send accepted in {mode:?}");
        }
    }
}

/// Low-power states wake to Standby, never straight to Receiving
#[test]
fn test_wake_goes_through_standby() {
    for mode in [RadioMode::Sleeping, RadioMode::PoweredDown] {
        assert_eq!(next_mode(mode, ModeEvent::PowerUpRequested), Some(RadioMode::Standby));
        assert_eq!(next_mode(mode, ModeEvent::DriverReady), None);
    }
}

#[test]
fn test_send_cycle_returns_to_receiving() {
    let modes = ModeController::new();
    modes.apply(ModeEvent::DriverReady).unwrap();

    for _ in 0..3 {
        modes.apply(ModeEvent::SendRequested).unwrap();
        assert_eq!(modes.mode(), RadioMode::Transmitting);
        assert!(modes.complete_transmission());
        assert_eq!(modes.mode(), RadioMode::Receiving);
        assert!(modes.take_transmission_complete());
    }
}

/// Polling fallback after the interrupt already completed is a no-op
#[test]
fn test_finish_after_interrupt_is_noop() {
    let modes = ModeController::new();
    modes.apply(ModeEvent::DriverReady).unwrap();
    modes.apply(ModeEvent::SendRequested).unwrap();

    assert!(modes.complete_transmission());
    assert!(!modes.finish_transmission());
    assert_eq!(modes.mode(), RadioMode::Receiving);
}

#[test]
fn test_illegal_transition_leaves_mode() {
    let modes = ModeController::new();
    modes.apply(ModeEvent::SleepRequested).unwrap_err();
    assert_eq!(modes.mode(), RadioMode::Standby);

    modes.apply(ModeEvent::DriverReady).unwrap();
    modes.apply(ModeEvent::SleepRequested).unwrap();
    let err = modes.apply(ModeEvent::SendRequested).unwrap_err();
    assert!(err.to_string().contains("Sleeping"));
    assert_eq!(modes.mode(), RadioMode::Sleeping);
}

/// Interrupt thread completing a transmission while the main thread polls
#[test]
fn test_completion_from_other_thread() {
    let modes = Arc::new(ModeController::new());
    modes.apply(ModeEvent::DriverReady).unwrap();

    for _ in 0..100 {
        modes.apply(ModeEvent::SendRequested).unwrap();
        let start = Arc::new(Barrier::new(2));
        let isr = Arc::clone(&modes);
        let isr_start = Arc::clone(&start);
        let irq = std::thread::spawn(move || {
            isr_start.wait();
            isr.complete_transmission()
        });

        start.wait();
        let by_poll = modes.finish_transmission();
        let by_irq = irq.join().unwrap();

        // Exactly one side wins; the latch records whether it was the interrupt
        assert!(by_irq ^ by_poll);
        assert_eq!(modes.mode(), RadioMode::Receiving);
        assert_eq!(modes.take_transmission_complete(), by_irq);
    }
}
