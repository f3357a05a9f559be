//! Tether
//!
//! Reactive synchronization primitives. This crate re-exports
//! [`tether_core`]; most programs only need the [`prelude`].
//!
//! ```no_run
//! use std::time::Duration;
//! use tether::prelude::*;
//!
//! # async fn demo() -> TetherResult<()> {
//! let query = ReactiveCell::new(String::new());
//! let debounced = Debounced::new(&query, Duration::from_millis(300))?;
//!
//! query.set("rust".to_string());
//! tokio::time::sleep(Duration::from_millis(300)).await;
//! assert_eq!(debounced.get(), "rust");
//! # Ok(())
//! # }
//! ```

pub use tether_core::*;

/// Commonly used types.
pub mod prelude {
    pub use tether_core::config::{ApiConfig, LoggingConfig, SchedulerConfig, StorageConfig, TetherConfig};
    pub use tether_core::error::{TetherError, TetherResult, UnifiedError};
    pub use tether_core::form::{FieldRules, FieldSpec, FieldState, Form, FormSchema, SubmitOutcome};
    pub use tether_core::logging::init_logging;
    pub use tether_core::reactive::{Computed, Counter, CounterOptions, Observe, ReactiveCell, Subscription};
    pub use tether_core::request::{ApiClient, HttpMethod, HttpTransport, RequestOptions, RequestOutcome};
    pub use tether_core::scheduler::{Debounced, DebouncedFn, Throttled};
    pub use tether_core::storage::{
        Codec, JsonCodec, KeyValueStore, StorageHub, StorageSync, StorageSyncOptions, StoreContext,
    };
}
