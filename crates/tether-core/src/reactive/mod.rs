//! Reactive value cells
//!
//! This module provides the change-tracking primitives every other component
//! is built on:
//!
//! - [`ReactiveCell`]: a shared, version-tracked value slot that notifies its
//!   listeners synchronously with `(new, old)` on every effective change.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Computed`]: a derived value that holds explicit subscriptions to the
//!   cells it depends on and recomputes eagerly when any of them changes.
//! - [`Counter`]: a bounded integer cell.
//!
//! # Invariants
//!
//! 1. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 2. Every effective mutation runs exactly one notification pass over the
//!    listener set as it existed at mutation time.
//! 3. Listeners are notified in registration order.
//! 4. Unsubscribing during a pass takes effect from the next pass on.
//! 5. No lock is held while listeners run, so listeners may read, write,
//!    subscribe and unsubscribe freely.

mod cell;
mod computed;
mod counter;

pub use cell::{ListenerId, Observe, ReactiveCell, Subscription, WeakCell};
pub use computed::Computed;
pub use counter::{Counter, CounterOptions};
