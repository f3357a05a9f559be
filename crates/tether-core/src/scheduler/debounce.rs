//! Quiet-period scheduling for cells and callbacks.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::timer::TimerSlot;
use crate::error::TetherResult;
use crate::reactive::{ReactiveCell, Subscription};

/// Output cell that follows a source only after `delay` without changes.
///
/// Every source change cancels the pending timer and schedules a new one;
/// when a timer survives its full delay the output takes the source's value
/// at that moment.
pub struct Debounced<T> {
    output: ReactiveCell<T>,
    slot: Arc<TimerSlot>,
    delay: Duration,
    _subscription: Subscription,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start debouncing `source`. Must be called inside a Tokio runtime.
    pub fn new(source: &ReactiveCell<T>, delay: Duration) -> TetherResult<Self> {
        let slot = TimerSlot::current()?;
        let output = ReactiveCell::new(source.get());

        let subscription = {
            let slot = Arc::clone(&slot);
            let output = output.clone();
            let weak_source = source.downgrade();
            source.subscribe(move |_, _| {
                let output = output.clone();
                let weak_source = weak_source.clone();
                slot.schedule(delay, move || {
                    let Some(source) = weak_source.upgrade() else {
                        return;
                    };
                    if output.set(source.get()) {
                        debug!(delay_ms = delay.as_millis() as u64, "debounced value updated");
                    }
                });
            })
        };

        Ok(Self {
            output,
            slot,
            delay,
            _subscription: subscription,
        })
    }

    /// Handle to the debounced output.
    pub fn output(&self) -> ReactiveCell<T> {
        self.output.clone()
    }

    pub fn get(&self) -> T {
        self.output.get()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a source change is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    /// Cancel the pending update and stop reacting to the source.
    pub fn dispose(&self) {
        self.slot.dispose();
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.slot.dispose();
    }
}

/// Callback wrapper that only runs after `delay` without further calls.
pub struct DebouncedFn<A> {
    callback: Arc<dyn Fn(A) + Send + Sync>,
    slot: Arc<TimerSlot>,
    delay: Duration,
}

impl<A> DebouncedFn<A>
where
    A: Send + 'static,
{
    /// Wrap `callback`. Must be called inside a Tokio runtime.
    pub fn new(delay: Duration, callback: impl Fn(A) + Send + Sync + 'static) -> TetherResult<Self> {
        Ok(Self {
            callback: Arc::new(callback),
            slot: TimerSlot::current()?,
            delay,
        })
    }

    /// Replace any pending invocation with one for `args`.
    pub fn call(&self, args: A) {
        let callback = Arc::clone(&self.callback);
        self.slot.schedule(self.delay, move || callback(args));
    }

    /// Drop the pending invocation.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<A> Drop for DebouncedFn<A> {
    fn drop(&mut self) {
        self.slot.dispose();
    }
}
