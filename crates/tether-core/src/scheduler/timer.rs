//! Single-occupancy timer slot.
//!
//! Each scheduled callback is tagged with a generation number. Scheduling or
//! cancelling bumps the generation, and a timer only fires when its
//! generation is still current when it wakes, so a superseded timer can
//! never deliver even if its task was already past the sleep when it was
//! aborted.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::error::{TetherError, TetherResult};

/// A pending scheduled callback.
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn cancel(self) {
        self.task.abort();
    }
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    pending: Option<TimerHandle>,
    disposed: bool,
}

/// Holds at most one pending timer; a new schedule replaces the old one.
#[derive(Debug)]
pub struct TimerSlot {
    runtime: Handle,
    state: Mutex<SlotState>,
}

impl TimerSlot {
    pub fn new(runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            runtime,
            state: Mutex::new(SlotState::default()),
        })
    }

    /// Slot bound to the runtime of the calling context.
    pub fn current() -> TetherResult<Arc<Self>> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| TetherError::runtime(format!("timers require a Tokio runtime: {}", e)))
    }

    /// Cancel any pending timer and run `callback` after `delay`.
    ///
    /// Returns `false` (and drops `callback`) once the slot is disposed.
    pub fn schedule(self: &Arc<Self>, delay: Duration, callback: impl FnOnce() + Send + 'static) -> bool {
        let mut state = self.state.lock();
        if state.disposed {
            return false;
        }
        if let Some(previous) = state.pending.take() {
            previous.cancel();
        }
        state.generation += 1;
        let generation = state.generation;

        let weak = Arc::downgrade(self);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(slot) = weak.upgrade() else {
                return;
            };
            if slot.claim(generation) {
                callback();
            }
        });
        trace!(generation, delay_ms = delay.as_millis() as u64, "timer scheduled");
        state.pending = Some(TimerHandle { generation, task });
        true
    }

    /// Drop the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        state.generation += 1;
        match state.pending.take() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and refuse every later schedule.
    pub fn dispose(&self) {
        self.state.lock().disposed = true;
        self.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    fn claim(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.disposed || state.generation != generation {
            return false;
        }
        // The firing task is the pending one; detach its handle without aborting.
        state.pending = None;
        true
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().pending.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let make = move || {
            let hits = Arc::clone(&hits_clone);
            Box::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (hits, make)
    }

    #[test]
    fn test_requires_runtime() {
        let err = TimerSlot::current().unwrap_err();
        assert!(matches!(err, TetherError::Runtime { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_timer() {
        let slot = TimerSlot::current().unwrap();
        let (hits, make) = counter();

        slot.schedule(Duration::from_millis(50), make());
        slot.schedule(Duration::from_millis(50), make());
        slot.schedule(Duration::from_millis(50), make());
        assert!(slot.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!slot.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let slot = TimerSlot::current().unwrap();
        let (hits, make) = counter();

        slot.schedule(Duration::from_millis(20), make());
        assert!(slot.cancel());
        assert!(!slot.cancel());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_rejects_new_timers() {
        let slot = TimerSlot::current().unwrap();
        let (hits, make) = counter();

        slot.schedule(Duration::from_millis(20), make());
        slot.dispose();
        assert!(!slot.schedule(Duration::from_millis(20), make()));
        assert!(slot.is_disposed());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
