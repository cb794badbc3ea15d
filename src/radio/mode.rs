//! # Radio Power/Mode State Machine
//!
//! The [`ModeController`] owns the radio's half-duplex operating mode and
//! enforces the legal transition set:
//!
//! ```text
//! Standby      --DriverReady-----------> Receiving
//! Receiving    --SendRequested---------> Transmitting
//! Transmitting --TransmissionComplete--> Receiving      (interrupt-owned)
//! Receiving    --SleepRequested--------> Sleeping
//! Transmitting --SleepRequested--------> Sleeping
//! Receiving    --PowerDownRequested----> PoweredDown
//! Transmitting --PowerDownRequested----> PoweredDown
//! Receiving    --StandbyRequested------> Standby
//! Sleeping     --Standby/PowerUp-------> Standby
//! PoweredDown  --Standby/PowerUp-------> Standby
//! ```
//!
//! A request whose target equals the current mode is accepted as a no-op.
//!
//! The mode lives in an atomic so the interrupt handler can perform its one
//! transition without a lock. Both contexts commit transitions with
//! compare-and-swap, so a late interrupt can never overwrite a transition the
//! polling context made in the meantime.

use crate::error::TransportError;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Radio half-duplex operating modes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    Sleeping = 0,
    PoweredDown = 1,
    Standby = 2,
    Receiving = 3,
    Transmitting = 4,
}

impl RadioMode {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RadioMode::Sleeping,
            1 => RadioMode::PoweredDown,
            3 => RadioMode::Receiving,
            4 => RadioMode::Transmitting,
            _ => RadioMode::Standby,
        }
    }
}

/// Events that request a mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// Driver bring-up (or re-initialisation / wake) succeeded
    DriverReady,
    SendRequested,
    /// Hardware reported the end of a transmission
    TransmissionComplete,
    SleepRequested,
    PowerDownRequested,
    StandbyRequested,
    PowerUpRequested,
}

/// Transition table. `None` marks an illegal request.
pub fn next_mode(from: RadioMode, event: ModeEvent) -> Option<RadioMode> {
    use ModeEvent::*;
    use RadioMode::*;

    match (from, event) {
        (Standby | Receiving, DriverReady) => Some(Receiving),
        (Receiving, SendRequested) => Some(Transmitting),
        (Transmitting, TransmissionComplete) => Some(Receiving),
        (Receiving | Transmitting | Sleeping, SleepRequested) => Some(Sleeping),
        (Receiving | Transmitting | PoweredDown, PowerDownRequested) => Some(PoweredDown),
        (Sleeping | PoweredDown | Standby, StandbyRequested | PowerUpRequested) => Some(Standby),
        (Receiving, StandbyRequested) => Some(Standby),
        _ => None,
    }
}

/// Owner of the current [`RadioMode`].
///
/// Shared between the polling context and the interrupt handler (behind an
/// `Arc`). The interrupt only ever calls [`complete_transmission`]; every other
/// transition belongs to the polling context.
///
/// [`complete_transmission`]: ModeController::complete_transmission
#[derive(Debug)]
pub struct ModeController {
    mode: AtomicU8,
    tx_complete: AtomicBool,
}

impl ModeController {
    /// Create a controller in `Standby`.
    pub fn new() -> Self {
        Self {
            mode: AtomicU8::new(RadioMode::Standby as u8),
            tx_complete: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> RadioMode {
        RadioMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Apply a polling-context transition.
    ///
    /// # Returns
    /// * `Ok(mode)` - the new mode
    /// * `Err(TransportError::IllegalTransition)` - request rejected, mode unchanged
    pub fn apply(&self, event: ModeEvent) -> Result<RadioMode, TransportError> {
        let mut current = self.mode.load(Ordering::Acquire);
        loop {
            let from = RadioMode::from_u8(current);
            let to = next_mode(from, event)
                .ok_or(TransportError::IllegalTransition { from, event })?;

            if event == ModeEvent::SendRequested {
                self.tx_complete.store(false, Ordering::Relaxed);
            }

            match self.mode.compare_exchange(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if from != to {
                        log::trace!("Radio mode {from:?} -> {to:?} ({event:?})");
                    }
                    return Ok(to);
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Interrupt-side transition: `Transmitting -> Receiving`.
    ///
    /// Latches the transmission-complete flag. Returns `false` without any
    /// change when the radio is not transmitting. Never logs.
    pub fn complete_transmission(&self) -> bool {
        let swapped = self
            .mode
            .compare_exchange(
                RadioMode::Transmitting as u8,
                RadioMode::Receiving as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if swapped {
            self.tx_complete.store(true, Ordering::Release);
        }
        swapped
    }

    /// Polling-side guarantee after the retry primitive returns: the radio is
    /// never left in `Transmitting`.
    ///
    /// Returns `true` if this call performed the return to `Receiving`,
    /// `false` if the interrupt already had (or the mode was changed).
    pub fn finish_transmission(&self) -> bool {
        self.mode
            .compare_exchange(
                RadioMode::Transmitting as u8,
                RadioMode::Receiving as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Consume the transmission-complete latch set by the interrupt.
    pub fn take_transmission_complete(&self) -> bool {
        self.tx_complete.swap(false, Ordering::AcqRel)
    }

    pub fn is_send_eligible(&self) -> bool {
        self.mode() == RadioMode::Receiving
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode_is_standby() {
        let modes = ModeController::new();
        assert_eq!(modes.mode(), RadioMode::Standby);
        assert!(!modes.is_send_eligible());
    }

    #[test]
    fn test_transmit_cycle() {
        let modes = ModeController::new();
        assert_eq!(modes.apply(ModeEvent::DriverReady).unwrap(), RadioMode::Receiving);
        assert_eq!(
            modes.apply(ModeEvent::SendRequested).unwrap(),
            RadioMode::Transmitting
        );

        assert!(modes.complete_transmission());
        assert_eq!(modes.mode(), RadioMode::Receiving);
        assert!(modes.take_transmission_complete());
        assert!(!modes.take_transmission_complete());

        // Already back in RX; the polling-side fallback has nothing to do
        assert!(!modes.finish_transmission());
        assert_eq!(modes.mode(), RadioMode::Receiving);
    }

    #[test]
    fn test_finish_without_interrupt() {
        let modes = ModeController::new();
        modes.apply(ModeEvent::DriverReady).unwrap();
        modes.apply(ModeEvent::SendRequested).unwrap();

        assert!(modes.finish_transmission());
        assert_eq!(modes.mode(), RadioMode::Receiving);
        assert!(!modes.take_transmission_complete());
    }

    #[test]
    fn test_completion_ignored_outside_transmit() {
        let modes = ModeController::new();
        assert!(!modes.complete_transmission());
        assert_eq!(modes.mode(), RadioMode::Standby);

        modes.apply(ModeEvent::DriverReady).unwrap();
        modes.apply(ModeEvent::SleepRequested).unwrap();
        assert!(!modes.complete_transmission());
        assert_eq!(modes.mode(), RadioMode::Sleeping);
    }

    #[test]
    fn test_illegal_transitions_leave_mode_unchanged() {
        let modes = ModeController::new();

        let err = modes.apply(ModeEvent::SendRequested).unwrap_err();
        assert!(matches!(
            err,
            TransportError::IllegalTransition {
                from: RadioMode::Standby,
                event: ModeEvent::SendRequested
            }
        ));
        assert_eq!(modes.mode(), RadioMode::Standby);

        modes.apply(ModeEvent::DriverReady).unwrap();
        modes.apply(ModeEvent::PowerDownRequested).unwrap();
        assert!(modes.apply(ModeEvent::DriverReady).is_err());
        assert!(modes.apply(ModeEvent::SleepRequested).is_err());
        assert_eq!(modes.mode(), RadioMode::PoweredDown);
    }

    #[test]
    fn test_wake_path() {
        let modes = ModeController::new();
        modes.apply(ModeEvent::DriverReady).unwrap();
        modes.apply(ModeEvent::SleepRequested).unwrap();
        assert_eq!(
            modes.apply(ModeEvent::PowerUpRequested).unwrap(),
            RadioMode::Standby
        );
        assert_eq!(modes.apply(ModeEvent::DriverReady).unwrap(), RadioMode::Receiving);
    }

    #[test]
    fn test_transition_table() {
        use ModeEvent::*;
        use RadioMode::*;

        assert_eq!(next_mode(Transmitting, TransmissionComplete), Some(Receiving));
        assert_eq!(next_mode(Transmitting, SleepRequested), Some(Sleeping));
        assert_eq!(next_mode(Transmitting, PowerDownRequested), Some(PoweredDown));
        assert_eq!(next_mode(PoweredDown, StandbyRequested), Some(Standby));
        assert_eq!(next_mode(Transmitting, SendRequested), None);
        assert_eq!(next_mode(Transmitting, DriverReady), None);
        assert_eq!(next_mode(Sleeping, SendRequested), None);
        assert_eq!(next_mode(Standby, TransmissionComplete), None);
    }
}
