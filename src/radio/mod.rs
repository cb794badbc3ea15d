//! # Radio Layer
//!
//! Driver capability traits, the radio mode state machine and a simulated
//! chip for running the transport without hardware.

pub mod driver;
pub mod mode;
pub mod sim;

pub use driver::{
    BufferedDriver, IrqContext, IrqFlags, PollingDriver, RadioDriver, RadioSettings, RetryPolicy,
};
pub use mode::{next_mode, ModeController, ModeEvent, RadioMode};
pub use sim::{PowerOp, SentFrame, SimRadio, SimRadioHandle};
