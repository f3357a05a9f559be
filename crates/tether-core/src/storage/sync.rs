//! Two-way binding between a reactive cell and one key of a host store.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::codec::{Codec, JsonCodec};
use super::store::{KeyValueStore, StorageEvent, WatchGuard};
use crate::error::TetherError;
use crate::reactive::{ReactiveCell, Subscription};

/// Construction options for [`StorageSync`].
pub struct StorageSyncOptions<T> {
    default: Option<T>,
    codec: Arc<dyn Codec<T>>,
}

impl<T> StorageSyncOptions<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// JSON codec, no default.
    pub fn new() -> Self {
        Self {
            default: None,
            codec: Arc::new(JsonCodec),
        }
    }
}

impl<T> Default for StorageSyncOptions<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StorageSyncOptions<T> {
    /// Options for types without serde support.
    pub fn with_codec(codec: impl Codec<T> + 'static) -> Self {
        Self {
            default: None,
            codec: Arc::new(codec),
        }
    }

    /// Value used when the key is absent or its stored form is unreadable.
    pub fn default_value(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    pub fn codec(mut self, codec: impl Codec<T> + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }
}

struct SyncShared<T> {
    key: String,
    store: Arc<dyn KeyValueStore>,
    codec: Arc<dyn Codec<T>>,
    default: Option<T>,
    /// Value being imported; the notification carrying it is not written back.
    echo: Mutex<Option<Option<T>>>,
    last_error: Mutex<Option<TetherError>>,
}

impl<T> SyncShared<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn read(&self) -> Option<T> {
        let raw = match self.store.get_item(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                self.record(TetherError::storage_read(e.to_string(), self.key.clone()));
                return self.default.clone();
            }
        };
        match raw {
            None => self.default.clone(),
            Some(raw) => self.decode(&raw).or_else(|| self.default.clone()),
        }
    }

    fn decode(&self, raw: &str) -> Option<T> {
        match self.codec.decode(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(TetherError::codec(e.to_string(), self.key.clone()));
                None
            }
        }
    }

    fn encode(&self, value: &T) -> Option<String> {
        match self.codec.encode(value) {
            Ok(raw) => Some(raw),
            Err(e) => {
                self.record(TetherError::codec(e.to_string(), self.key.clone()));
                None
            }
        }
    }

    fn write(&self, value: Option<&T>) {
        let result = match value {
            Some(value) => {
                let Some(raw) = self.encode(value) else {
                    return;
                };
                self.store.set_item(&self.key, &raw)
            }
            None => self.store.remove_item(&self.key),
        };
        match result {
            Ok(()) => debug!(key = %self.key, removed = value.is_none(), "storage entry written"),
            Err(e) => self.record(e.into()),
        }
    }

    fn record(&self, error: TetherError) {
        warn!(key = %self.key, error = %error, "storage sync failure");
        *self.last_error.lock() = Some(error);
    }

    fn import(&self, cell: &ReactiveCell<Option<T>>, value: Option<T>) -> bool {
        *self.echo.lock() = Some(value.clone());
        let changed = cell.set(value);
        if !changed {
            self.echo.lock().take();
        }
        changed
    }

    /// Whether `new` is the notification of an import rather than a local change.
    fn is_echo(&self, new: &Option<T>) -> bool {
        let mut echo = self.echo.lock();
        if echo.as_ref() == Some(new) {
            echo.take();
            true
        } else {
            false
        }
    }

    fn on_external(&self, cell: &ReactiveCell<Option<T>>, event: &StorageEvent) {
        if event.key.as_deref().is_some_and(|key| key != self.key) {
            return;
        }
        let current = cell.with(|value| value.as_ref().and_then(|v| self.codec.encode(v).ok()));
        if current.as_deref() == event.new_value.as_deref() {
            return;
        }

        let next = match &event.new_value {
            Some(raw) => match self.decode(raw) {
                Some(value) => Some(value),
                None => return,
            },
            None => self.default.clone(),
        };
        if self.import(cell, next) {
            debug!(key = %self.key, "imported change from another context");
        }
    }
}

/// A [`ReactiveCell`] kept consistent with one key of a [`KeyValueStore`].
///
/// Local changes to the cell are encoded and written under the key, or
/// remove it when the cell becomes `None`. Changes made by other contexts are
/// decoded into the cell without being written back. Failures never reach
/// the caller; the most recent one is kept in [`last_error`](Self::last_error)
/// and the in-memory value stays authoritative.
pub struct StorageSync<T> {
    cell: ReactiveCell<Option<T>>,
    shared: Arc<SyncShared<T>>,
    _cell_subscription: Subscription,
    _watch: WatchGuard,
}

impl<T: fmt::Debug> fmt::Debug for StorageSync<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSync")
            .field("key", &self.shared.key)
            .field("cell", &self.cell)
            .finish()
    }
}

impl<T> StorageSync<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Bind `key` of `store`. Nothing is written until the value changes.
    pub fn new(key: impl Into<String>, store: Arc<dyn KeyValueStore>, options: StorageSyncOptions<T>) -> Self {
        let shared = Arc::new(SyncShared {
            key: key.into(),
            store,
            codec: options.codec,
            default: options.default,
            echo: Mutex::new(None),
            last_error: Mutex::new(None),
        });
        let cell = ReactiveCell::new(shared.read());
        debug!(key = %shared.key, "storage sync initialised");

        let cell_subscription = {
            let shared = Arc::clone(&shared);
            cell.subscribe(move |new: &Option<T>, _| {
                if shared.is_echo(new) {
                    return;
                }
                shared.write(new.as_ref());
            })
        };

        let watch = {
            let listener_shared = Arc::clone(&shared);
            let weak = cell.downgrade();
            shared.store.watch(Arc::new(move |event: &StorageEvent| {
                if let Some(cell) = weak.upgrade() {
                    listener_shared.on_external(&cell, event);
                }
            }))
        };

        Self {
            cell,
            shared,
            _cell_subscription: cell_subscription,
            _watch: watch,
        }
    }

    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// The bound cell. Setting it writes through to the store.
    pub fn cell(&self) -> ReactiveCell<Option<T>> {
        self.cell.clone()
    }

    pub fn value(&self) -> Option<T> {
        self.cell.get()
    }

    pub fn set_value(&self, value: T) -> bool {
        self.cell.set(Some(value))
    }

    /// Clear the cell and delete the stored entry.
    pub fn remove(&self) {
        self.shared.import(&self.cell, None);
        self.shared.write(None);
    }

    /// Edit the current value (or the default when absent) and write it.
    ///
    /// Returns `false` when there is nothing to edit or the edit changed nothing.
    pub fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        let Some(mut value) = self.cell.get().or_else(|| self.shared.default.clone()) else {
            return false;
        };
        f(&mut value);
        self.cell.set(Some(value))
    }

    /// Re-read the stored entry into the cell without writing back.
    pub fn refresh(&self) -> bool {
        let value = self.shared.read();
        self.shared.import(&self.cell, value)
    }

    /// Most recent failure, if any.
    pub fn last_error(&self) -> Option<TetherError> {
        self.shared.last_error.lock().clone()
    }

    pub fn take_error(&self) -> Option<TetherError> {
        self.shared.last_error.lock().take()
    }
}

impl StorageSync<Value> {
    /// Shallow-merge the members of `updates` into the stored object.
    ///
    /// A non-object current value is replaced by an object. Returns `false`
    /// when `updates` is not an object or nothing changed.
    pub fn merge(&self, updates: Value) -> bool {
        let Value::Object(updates) = updates else {
            warn!(key = %self.shared.key, "merge ignored: update is not an object");
            return false;
        };
        let mut merged = match self.cell.get().or_else(|| self.shared.default.clone()) {
            Some(Value::Object(current)) => current,
            _ => serde_json::Map::new(),
        };
        merged.extend(updates);
        self.cell.set(Some(Value::Object(merged)))
    }
}
