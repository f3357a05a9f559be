//! ReactiveCell<T>: a single value slot with synchronous change notification.
//!
//! Listeners are stored as `Arc<dyn Fn(&T, &T)>` so snapshots are cheap.
//! Snapshot-on-set semantics mean:
//!   - A listener removed *during* a notification pass is still called in
//!     that pass.
//!   - A listener added *during* a pass is NOT called until the next change.
//!
//! Passes never nest. A `set` made while a pass is running updates the value
//! at once and queues its notification; queued notifications are delivered
//! in order by the caller that started the first pass.
//!
//! State is protected by a `parking_lot::Mutex` that is never held while
//! listeners run.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Identifier of a registered listener, unique per cell.
pub type ListenerId = u64;

type ListenerFn<T> = dyn Fn(&T, &T) + Send + Sync;

struct Notification<T> {
    new: T,
    old: T,
    listeners: Vec<Arc<ListenerFn<T>>>,
}

struct CellState<T> {
    value: T,
    version: u64,
    listeners: Vec<(ListenerId, Arc<ListenerFn<T>>)>,
    queue: VecDeque<Notification<T>>,
    notifying: bool,
}

struct CellInner<T> {
    state: Mutex<CellState<T>>,
    next_id: AtomicU64,
}

/// A shared, observable value.
///
/// Cloning a `ReactiveCell` creates a new handle to the **same** value.
pub struct ReactiveCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ReactiveCell")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl<T> ReactiveCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(CellInner {
                state: Mutex::new(CellState {
                    value,
                    version: 0,
                    listeners: Vec::new(),
                    queue: VecDeque::new(),
                    notifying: false,
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.state.lock().value.clone()
    }

    /// Borrow the current value without cloning.
    ///
    /// The cell is locked for the duration of `f`; do not call back into the
    /// same cell from inside it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.state.lock().value)
    }

    /// Replace the value.
    ///
    /// Returns `true` when the value changed. Listeners are notified before
    /// this returns, unless it is called from inside a notification pass of
    /// the same cell; then the notification runs after the current pass.
    pub fn set(&self, value: T) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.value == value {
                return false;
            }
            let old = std::mem::replace(&mut state.value, value);
            state.version += 1;
            let notification = Notification {
                new: state.value.clone(),
                old,
                listeners: state
                    .listeners
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect(),
            };
            state.queue.push_back(notification);
            if state.notifying {
                return true;
            }
            state.notifying = true;
        }
        self.drain();
        true
    }

    fn drain(&self) {
        let mut reset = DrainReset {
            inner: &self.inner,
            finished: false,
        };
        loop {
            let notification = {
                let mut state = self.inner.state.lock();
                match state.queue.pop_front() {
                    Some(notification) => notification,
                    None => {
                        state.notifying = false;
                        reset.finished = true;
                        return;
                    }
                }
            };
            for listener in &notification.listeners {
                listener(&notification.new, &notification.old);
            }
        }
    }

    /// Edit a copy of the value in place and store it.
    ///
    /// Goes through [`set`](Self::set), so an edit that leaves the value
    /// unchanged does not notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register `listener`, called with `(new, old)` after each change.
    pub fn subscribe(&self, listener: impl Fn(&T, &T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .state
            .lock()
            .listeners
            .push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Number of effective changes since creation.
    pub fn version(&self) -> u64 {
        self.inner.state.lock().version
    }

    /// Number of currently registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Non-owning handle, used by components that must not keep the cell
    /// alive from inside its own listener list.
    pub fn downgrade(&self) -> WeakCell<T> {
        WeakCell {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Default for ReactiveCell<T>
where
    T: Clone + PartialEq + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Leaves the cell able to notify again if a listener panics mid-pass.
struct DrainReset<'a, T> {
    inner: &'a CellInner<T>,
    finished: bool,
}

impl<T> Drop for DrainReset<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.inner.state.lock();
        state.notifying = false;
        state.queue.clear();
    }
}

/// Weak counterpart of [`ReactiveCell`].
pub struct WeakCell<T> {
    inner: Weak<CellInner<T>>,
}

impl<T> Clone for WeakCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakCell<T> {
    /// Upgrade to a strong handle if the cell is still alive.
    pub fn upgrade(&self) -> Option<ReactiveCell<T>> {
        self.inner.upgrade().map(|inner| ReactiveCell { inner })
    }
}

/// Guard returned by [`ReactiveCell::subscribe`].
///
/// Dropping it removes the listener; so does [`unsubscribe`](Self::unsubscribe).
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

/// Anything a derived value can depend on.
pub trait Observe {
    /// Call `on_change` after every change until the returned guard drops.
    fn observe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

impl<T> Observe for ReactiveCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn observe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.subscribe(move |_, _| on_change())
    }
}
