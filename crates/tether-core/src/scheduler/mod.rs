//! Timed value scheduling
//!
//! Debounce and throttle policies applied to a [`ReactiveCell`] source,
//! producing an output cell:
//!
//! - [`Debounced`]: output follows the source once it has been quiet for
//!   `delay`.
//! - [`Throttled`]: output changes at most once per `delay` window with a
//!   leading update, and the last suppressed value is delivered when the
//!   window closes.
//! - [`DebouncedFn`]: the same quiet-period rule applied to a callback.
//!
//! Every scheduler owns exactly one [`TimerSlot`], so at most one timer is
//! pending per instance. Timers run on the Tokio runtime that was current
//! when the scheduler was created; dropping or disposing a scheduler cancels
//! its timer and no callback fires afterwards.
//!
//! [`ReactiveCell`]: crate::reactive::ReactiveCell

mod debounce;
mod throttle;
mod timer;

pub use debounce::{Debounced, DebouncedFn};
pub use throttle::Throttled;
pub use timer::{TimerHandle, TimerSlot};
