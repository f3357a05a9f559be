//! Bounded integer counter backed by a [`ReactiveCell`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cell::ReactiveCell;

/// Bounds and step for a [`Counter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterOptions {
    pub initial: i64,
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            initial: 0,
            min: i64::MIN,
            max: i64::MAX,
            step: 1,
        }
    }
}

/// Counter that refuses to leave `[min, max]`.
#[derive(Debug, Clone)]
pub struct Counter {
    count: ReactiveCell<i64>,
    options: CounterOptions,
}

impl Counter {
    pub fn new(options: CounterOptions) -> Self {
        Self {
            count: ReactiveCell::new(options.initial),
            options,
        }
    }

    pub fn get(&self) -> i64 {
        self.count.get()
    }

    /// Underlying cell, for subscriptions.
    pub fn cell(&self) -> &ReactiveCell<i64> {
        &self.count
    }

    pub fn can_increment(&self) -> bool {
        self.get()
            .checked_add(self.options.step)
            .is_some_and(|next| next <= self.options.max)
    }

    pub fn can_decrement(&self) -> bool {
        self.get()
            .checked_sub(self.options.step)
            .is_some_and(|next| next >= self.options.min)
    }

    pub fn is_at_min(&self) -> bool {
        self.get() == self.options.min
    }

    pub fn is_at_max(&self) -> bool {
        self.get() == self.options.max
    }

    pub fn increment(&self) -> bool {
        if !self.can_increment() {
            warn!(max = self.options.max, "cannot increment: would exceed maximum");
            return false;
        }
        let step = self.options.step;
        self.count.update(|c| *c += step);
        debug!(count = self.get(), "counter incremented");
        true
    }

    pub fn decrement(&self) -> bool {
        if !self.can_decrement() {
            warn!(min = self.options.min, "cannot decrement: would go below minimum");
            return false;
        }
        let step = self.options.step;
        self.count.update(|c| *c -= step);
        debug!(count = self.get(), "counter decremented");
        true
    }

    /// Set an explicit value; rejected when outside the bounds.
    pub fn set(&self, value: i64) -> bool {
        if value < self.options.min || value > self.options.max {
            warn!(
                value,
                min = self.options.min,
                max = self.options.max,
                "cannot set counter outside its bounds"
            );
            return false;
        }
        self.count.set(value);
        true
    }

    pub fn reset(&self) {
        self.count.set(self.options.initial);
    }
}
