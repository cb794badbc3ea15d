//! # Logging Utilities
//!
//! Rate-limited warnings and frame dumps for the polling side of the
//! transport. Nothing in here may be called from interrupt context.
//!
//! ```rust
//! use rfm69_transport::util::logging::LogThrottle;
//!
//! // At most 5 overflow warnings per 10 s; the rest are counted
//! let mut overflow_log = LogThrottle::new(10_000, 5);
//! for n in 0..8 {
//!     rfm69_transport::log_warn_throttled!(overflow_log, "queue full ({n})");
//! }
//! assert_eq!(overflow_log.take_suppressed(), 3);
//! ```

use std::time::{Duration, Instant};

/// Caps how many messages of one kind are emitted per time window and counts
/// the ones held back, so the next emitted message can report them.
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    limit: u32,
    emitted: u32,
    suppressed: u32,
    window_start: Instant,
}

impl LogThrottle {
    pub fn new(window_ms: u64, limit: u32) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            limit,
            emitted: 0,
            suppressed: 0,
            window_start: Instant::now(),
        }
    }

    /// Whether the next message may be emitted. A refused message is counted
    /// as suppressed.
    pub fn allow(&mut self) -> bool {
        if self.window_start.elapsed() >= self.window {
            self.window_start = Instant::now();
            self.emitted = 0;
        }
        if self.emitted < self.limit {
            self.emitted += 1;
            true
        } else {
            self.suppressed = self.suppressed.saturating_add(1);
            false
        }
    }

    /// Messages held back since the last call.
    pub fn take_suppressed(&mut self) -> u32 {
        std::mem::take(&mut self.suppressed)
    }

    /// Open a fresh window; the suppressed count is kept.
    pub fn reset(&mut self) {
        self.window_start = Instant::now();
        self.emitted = 0;
    }
}

/// Dump a frame at debug level as upper-case hex.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("{prefix} [{}] {}", data.len(), hex::encode_upper(data));
    }
}

/// `log::warn!` through a [`LogThrottle`]. When earlier messages were held
/// back, their count is appended to the next one that gets through.
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {{
        let throttle: &mut $crate::util::logging::LogThrottle = &mut $throttle;
        if throttle.allow() {
            match throttle.take_suppressed() {
                0 => log::warn!($($arg)*),
                held => log::warn!("{} ({} similar suppressed)", format_args!($($arg)*), held),
            }
        }
    }};
}
