//! Timing properties of the debounce and throttle schedulers on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tether_core::TetherError;
use tether_core::reactive::{ReactiveCell, Subscription};
use tether_core::scheduler::{Debounced, DebouncedFn, Throttled};
use tokio::time::{Instant, advance, sleep};

type Log<T> = Arc<Mutex<Vec<(T, Duration)>>>;

fn record<T>(cell: &ReactiveCell<T>, start: Instant) -> (Log<T>, Subscription)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let log: Log<T> = Arc::new(Mutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    let sub = cell.subscribe(move |new, _| log_clone.lock().push((new.clone(), start.elapsed())));
    (log, sub)
}

#[tokio::test(start_paused = true)]
async fn debounce_emits_once_after_burst() {
    let input = ReactiveCell::new(String::new());
    let debounced = Debounced::new(&input, Duration::from_millis(300)).unwrap();
    let start = Instant::now();
    let (log, _sub) = record(&debounced.output(), start);

    for word in ["r", "ru", "rus", "rust"] {
        input.set(word.to_string());
        sleep(Duration::from_millis(100)).await;
    }
    // Last input at t=300ms.
    sleep(Duration::from_millis(500)).await;

    let log = log.lock();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, "rust");
    assert!(log[0].1 >= Duration::from_millis(600), "fired at {:?}", log[0].1);
    assert!(log[0].1 < Duration::from_millis(605));
}

#[tokio::test(start_paused = true)]
async fn debounce_separate_bursts_emit_separately() {
    let input = ReactiveCell::new(0);
    let debounced = Debounced::new(&input, Duration::from_millis(50)).unwrap();
    let (log, _sub) = record(&debounced.output(), Instant::now());

    input.set(1);
    input.set(2);
    sleep(Duration::from_millis(80)).await;
    input.set(3);
    sleep(Duration::from_millis(80)).await;

    let values: Vec<i32> = log.lock().iter().map(|(v, _)| *v).collect();
    assert_eq!(values, vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn dropping_scheduler_cancels_timer() {
    let input = ReactiveCell::new(0);
    let debounced = Debounced::new(&input, Duration::from_millis(50)).unwrap();
    let output = debounced.output();
    input.set(9);
    assert!(debounced.is_pending());
    drop(debounced);

    advance(Duration::from_millis(200)).await;
    assert_eq!(output.get(), 0);
    // The source no longer has the scheduler's listener.
    assert_eq!(input.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn throttle_delivers_last_value_of_window() {
    let input = ReactiveCell::new(0);
    let throttled = Throttled::new(&input, Duration::from_millis(100)).unwrap();
    let start = Instant::now();
    let (log, _sub) = record(&throttled.output(), start);

    input.set(1);
    for value in 2..=5 {
        sleep(Duration::from_millis(15)).await;
        input.set(value);
    }
    // Last suppressed input at t=60ms; trailing delivery at t=100ms.
    sleep(Duration::from_millis(200)).await;

    let log = log.lock();
    let values: Vec<i32> = log.iter().map(|(v, _)| *v).collect();
    assert_eq!(values, vec![1, 5]);
    assert!(log[1].1 >= Duration::from_millis(100) && log[1].1 <= Duration::from_millis(160));
}

#[tokio::test(start_paused = true)]
async fn debounced_fn_runs_last_call_only() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let calls_clone = Arc::clone(&calls);
    let search = DebouncedFn::new(Duration::from_millis(300), move |q: String| calls_clone.lock().push(q)).unwrap();

    search.call("a".to_string());
    sleep(Duration::from_millis(100)).await;
    search.call("ab".to_string());
    sleep(Duration::from_millis(400)).await;
    search.call("abc".to_string());
    assert!(search.cancel());
    sleep(Duration::from_millis(400)).await;

    assert_eq!(*calls.lock(), vec!["ab".to_string()]);
}

#[test]
fn schedulers_require_a_runtime() {
    let input = ReactiveCell::new(0);
    assert!(matches!(
        Debounced::new(&input, Duration::from_millis(10)),
        Err(TetherError::Runtime { .. })
    ));
}
