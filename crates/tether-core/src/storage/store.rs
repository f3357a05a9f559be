//! Host key-value store contract.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Host store failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("quota exceeded writing '{key}': {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("failed to persist '{key}': {message}")]
    Persist { key: String, message: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Change made to the host store by another execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key; `None` when the whole store was cleared.
    pub key: Option<String>,
    pub old_value: Option<String>,
    /// New stored string; `None` when the key was removed.
    pub new_value: Option<String>,
}

/// Callback for [`StorageEvent`]s.
pub type StorageListener = dyn Fn(&StorageEvent) + Send + Sync;

/// The host store as seen from one execution context.
///
/// Implementations notify watchers of changes made by other contexts only.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Register for cross-context change notifications until the guard drops.
    fn watch(&self, listener: Arc<StorageListener>) -> WatchGuard;
}

/// Registration returned by [`KeyValueStore::watch`]; removes the listener on drop.
#[must_use = "dropping a WatchGuard stops change notifications"]
pub struct WatchGuard {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl WatchGuard {
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard for stores that never emit notifications.
    pub fn inert() -> Self {
        Self { detach: None }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
