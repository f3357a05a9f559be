//! Tether core
//!
//! Reactive synchronization primitives: observable cells, debounced and
//! throttled derivations, cells bound to a shared key-value store, a form
//! validation engine and an HTTP request lifecycle manager.
//!
//! Components build on each other leaf-first:
//!
//! 1. [`reactive`]: [`ReactiveCell`](reactive::ReactiveCell) and derived values.
//! 2. [`scheduler`]: debounce and throttle policies over a cell.
//! 3. [`storage`]: a cell kept in sync with one store key across contexts.
//! 4. [`form`]: per-field rules and aggregate form state.
//! 5. [`request`]: timeout-bounded requests reduced to a uniform outcome.
//!
//! Recoverable failures never escape as panics or uncaught errors; they are
//! reported as field state, recorded channel errors or `Failure` outcomes.

pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod reactive;
pub mod request;
pub mod scheduler;
pub mod storage;

pub use config::TetherConfig;
pub use error::{TetherError, TetherResult, UnifiedError};
