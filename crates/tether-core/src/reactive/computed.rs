//! Derived values with explicit dependency registration.
//!
//! # Design
//!
//! [`Computed<T>`] owns a compute function, the [`ReactiveCell`] holding its
//! latest result, and one [`Subscription`] per source. A change on any source
//! recomputes immediately and stores the result through `ReactiveCell::set`,
//! so observers of the computed value are only notified when the derived
//! value actually changes.
//!
//! Source listeners hold a `Weak` reference to the computed state; dropping
//! the last `Computed` handle tears down every subscription.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::cell::{Observe, ReactiveCell, Subscription};

struct ComputedInner<T> {
    output: ReactiveCell<T>,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    /// Kept alive for the lifetime of the computed value; never read.
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<T> ComputedInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn recompute(&self) {
        self.output.set((self.compute)());
    }
}

/// A value derived from one or more observable sources.
///
/// Cloning a `Computed` creates a new handle to the **same** derived state.
pub struct Computed<T> {
    inner: Arc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Computed<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("output", &self.inner.output)
            .field("sources", &self.inner.subscriptions.lock().len())
            .finish()
    }
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Derive a value from an arbitrary set of sources.
    ///
    /// `compute` runs once immediately and again after every change on any of
    /// `sources`.
    pub fn new(sources: &[&dyn Observe], compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let inner = Arc::new(ComputedInner {
            output: ReactiveCell::new(compute()),
            compute: Box::new(compute),
            subscriptions: Mutex::new(Vec::with_capacity(sources.len())),
        });

        let subscriptions: Vec<Subscription> = sources
            .iter()
            .map(|source| {
                let weak = Arc::downgrade(&inner);
                source.observe(Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.recompute();
                    }
                }))
            })
            .collect();
        *inner.subscriptions.lock() = subscriptions;

        Self { inner }
    }

    /// Derive a value from a single cell.
    pub fn from_cell<S>(source: &ReactiveCell<S>, map: impl Fn(&S) -> T + Send + Sync + 'static) -> Self
    where
        S: Clone + PartialEq + Send + Sync + 'static,
    {
        let source_clone = source.clone();
        Self::new(&[source as &dyn Observe], move || source_clone.with(|value| map(value)))
    }

    /// Derive a value from two cells.
    pub fn from2<S1, S2>(
        s1: &ReactiveCell<S1>,
        s2: &ReactiveCell<S2>,
        map: impl Fn(&S1, &S2) -> T + Send + Sync + 'static,
    ) -> Self
    where
        S1: Clone + PartialEq + Send + Sync + 'static,
        S2: Clone + PartialEq + Send + Sync + 'static,
    {
        let s1_clone = s1.clone();
        let s2_clone = s2.clone();
        Self::new(&[s1 as &dyn Observe, s2 as &dyn Observe], move || map(&s1_clone.get(), &s2_clone.get()))
    }

    /// Current derived value.
    pub fn get(&self) -> T {
        self.inner.output.get()
    }

    /// The cell holding the derived value, for subscriptions.
    pub fn cell(&self) -> &ReactiveCell<T> {
        &self.inner.output
    }

    /// Subscribe to changes of the derived value.
    pub fn subscribe(&self, listener: impl Fn(&T, &T) + Send + Sync + 'static) -> Subscription {
        self.inner.output.subscribe(listener)
    }

    /// Number of sources this value depends on.
    pub fn source_count(&self) -> usize {
        self.inner.subscriptions.lock().len()
    }
}
