//! Rate-limited cell updates with leading and trailing delivery.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::timer::TimerSlot;
use crate::error::TetherResult;
use crate::reactive::{ReactiveCell, Subscription};

/// Output cell that changes at most once per `delay` window.
///
/// A source change at least `delay` after the last output update is applied
/// immediately. Earlier changes schedule a trailing update for the remainder
/// of the window; a newer change in the same window replaces it, and the
/// trailing update reads the source when it fires, so the last value of a
/// window is always delivered.
pub struct Throttled<T> {
    output: ReactiveCell<T>,
    slot: Arc<TimerSlot>,
    delay: Duration,
    last_update: Arc<Mutex<Option<Instant>>>,
    _subscription: Subscription,
}

impl<T> Throttled<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start throttling `source`. Must be called inside a Tokio runtime.
    pub fn new(source: &ReactiveCell<T>, delay: Duration) -> TetherResult<Self> {
        let slot = TimerSlot::current()?;
        let output = ReactiveCell::new(source.get());
        let last_update: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));

        let subscription = {
            let slot = Arc::clone(&slot);
            let output = output.clone();
            let last_update = Arc::clone(&last_update);
            let weak_source = source.downgrade();
            source.subscribe(move |new, _| {
                if slot.is_disposed() {
                    return;
                }
                let now = Instant::now();
                let last = *last_update.lock();
                match last.map(|last| now.saturating_duration_since(last)) {
                    Some(elapsed) if elapsed < delay => {
                        let weak_source = weak_source.clone();
                        let output = output.clone();
                        let last_update = Arc::clone(&last_update);
                        slot.schedule(delay - elapsed, move || {
                            let Some(source) = weak_source.upgrade() else {
                                return;
                            };
                            output.set(source.get());
                            *last_update.lock() = Some(Instant::now());
                            debug!("throttled value updated after window");
                        });
                    }
                    _ => {
                        // A trailing update from the previous window would be stale now.
                        slot.cancel();
                        *last_update.lock() = Some(now);
                        output.set(new.clone());
                        debug!("throttled value updated immediately");
                    }
                }
            })
        };

        Ok(Self {
            output,
            slot,
            delay,
            last_update,
            _subscription: subscription,
        })
    }

    /// Handle to the throttled output.
    pub fn output(&self) -> ReactiveCell<T> {
        self.output.clone()
    }

    pub fn get(&self) -> T {
        self.output.get()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a trailing update is scheduled.
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    /// Time of the last output update, if any.
    pub fn last_update(&self) -> Option<Instant> {
        *self.last_update.lock()
    }

    /// Cancel the trailing update and stop reacting to the source.
    pub fn dispose(&self) {
        self.slot.dispose();
    }
}

impl<T> Drop for Throttled<T> {
    fn drop(&mut self) {
        self.slot.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(100);

    fn record(cell: &ReactiveCell<i32>, start: Instant) -> (Arc<Mutex<Vec<(i32, Duration)>>>, Subscription) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let sub = cell.subscribe(move |new, _| log_clone.lock().push((*new, start.elapsed())));
        (log, sub)
    }

    fn near(actual: Duration, expected_ms: u64) -> bool {
        let expected = Duration::from_millis(expected_ms);
        actual >= expected && actual < expected + Duration::from_millis(5)
    }

    #[tokio::test(start_paused = true)]
    async fn test_leading_then_trailing() {
        let source = ReactiveCell::new(0);
        let throttled = Throttled::new(&source, DELAY).unwrap();
        let start = Instant::now();
        let (log, _sub) = record(&throttled.output(), start);

        source.set(1);
        assert_eq!(throttled.get(), 1);

        sleep(Duration::from_millis(10)).await;
        source.set(2);
        sleep(Duration::from_millis(10)).await;
        source.set(3);
        assert!(throttled.is_pending());
        assert_eq!(throttled.get(), 1);

        sleep(Duration::from_millis(130)).await;
        source.set(4);
        sleep(Duration::from_millis(200)).await;

        let log = log.lock();
        let values: Vec<i32> = log.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![1, 3, 4]);
        assert!(near(log[0].1, 0));
        assert!(near(log[1].1, 100), "trailing at {:?}", log[1].1);
        assert!(near(log[2].1, 200), "second trailing at {:?}", log[2].1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_change_per_window() {
        let source = ReactiveCell::new(0);
        let throttled = Throttled::new(&source, DELAY).unwrap();
        let start = Instant::now();
        let (log, _sub) = record(&throttled.output(), start);

        for value in 1..=50 {
            source.set(value);
            sleep(Duration::from_millis(7)).await;
        }
        sleep(DELAY * 2).await;

        let log = log.lock();
        for pair in log.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= DELAY, "window violated: {:?}", pair);
        }
        assert_eq!(log.last().map(|(v, _)| *v), Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_source_updates_immediately() {
        let source = ReactiveCell::new(0);
        let throttled = Throttled::new(&source, DELAY).unwrap();

        source.set(1);
        sleep(Duration::from_millis(150)).await;
        source.set(2);
        assert_eq!(throttled.get(), 2);
        assert!(!throttled.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_within_window_is_ignored() {
        let source = ReactiveCell::new(0);
        let throttled = Throttled::new(&source, DELAY).unwrap();

        source.set(1);
        source.set(1);
        assert!(!throttled.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_matches_source_rewritten_by_earlier_listener() {
        let source = ReactiveCell::new(0);
        let weak = source.downgrade();
        let _round_up = source.subscribe(move |new, _| {
            if *new % 2 == 1 {
                if let Some(source) = weak.upgrade() {
                    source.set(*new + 1);
                }
            }
        });
        let throttled = Throttled::new(&source, DELAY).unwrap();

        source.set(3);
        sleep(Duration::from_millis(300)).await;
        assert_eq!(source.get(), 4);
        assert_eq!(throttled.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_suppresses_trailing_update() {
        let source = ReactiveCell::new(0);
        let throttled = Throttled::new(&source, DELAY).unwrap();
        source.set(1);
        source.set(2);
        throttled.dispose();

        sleep(Duration::from_millis(300)).await;
        assert_eq!(throttled.get(), 1);

        source.set(3);
        assert_eq!(throttled.get(), 1);
    }
}
