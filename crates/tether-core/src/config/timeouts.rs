//! Default timing values
//!
//! Every value here can be overridden through [`TetherConfig`](super::TetherConfig).

use std::time::Duration;

/// Bounded wait for one outbound request.
pub const REQUEST_TIMEOUT_MS: u64 = 5000;

/// Quiet period before a debounced value updates.
pub const DEBOUNCE_MS: u64 = 300;

/// Minimum spacing between throttled updates.
pub const THROTTLE_MS: u64 = 300;

pub fn request_timeout() -> Duration {
    Duration::from_millis(REQUEST_TIMEOUT_MS)
}

pub fn debounce_delay() -> Duration {
    Duration::from_millis(DEBOUNCE_MS)
}

pub fn throttle_delay() -> Duration {
    Duration::from_millis(THROTTLE_MS)
}
