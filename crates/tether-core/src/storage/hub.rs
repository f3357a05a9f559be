//! In-process host store shared by execution contexts.
//!
//! A [`StorageHub`] owns the entries; each [`StoreContext`] is one context's
//! view of it. Writes through a context notify the watchers registered by
//! every *other* context, and only when the stored value actually changed.
//!
//! With a backing file the full map is written as JSON after each mutation.
//! A failed write leaves the in-memory map as it was before the mutation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::store::{KeyValueStore, StorageError, StorageEvent, StorageListener, WatchGuard};
use crate::config::StorageConfig;
use crate::error::{TetherError, TetherResult};

/// Identifier of one execution context.
pub type ContextId = u64;

struct Watcher {
    id: u64,
    context: ContextId,
    listener: Arc<StorageListener>,
}

struct HubInner {
    entries: RwLock<BTreeMap<String, String>>,
    watchers: Mutex<Vec<Watcher>>,
    next_context: AtomicU64,
    next_watch: AtomicU64,
    writes: AtomicU64,
    quota_bytes: Option<usize>,
    path: Option<PathBuf>,
}

/// Process-wide host key-value store.
#[derive(Clone)]
pub struct StorageHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for StorageHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHub")
            .field("entries", &self.inner.entries.read().len())
            .field("watchers", &self.inner.watchers.lock().len())
            .field("quota_bytes", &self.inner.quota_bytes)
            .field("path", &self.inner.path)
            .finish()
    }
}

impl StorageHub {
    fn build(entries: BTreeMap<String, String>, quota_bytes: Option<usize>, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                entries: RwLock::new(entries),
                watchers: Mutex::new(Vec::new()),
                next_context: AtomicU64::new(1),
                next_watch: AtomicU64::new(1),
                writes: AtomicU64::new(0),
                quota_bytes,
                path,
            }),
        }
    }

    /// Volatile store without a quota.
    pub fn in_memory() -> Self {
        Self::build(BTreeMap::new(), None, None)
    }

    /// Volatile store that rejects writes growing it past `quota_bytes`
    /// (sum of key and value lengths).
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self::build(BTreeMap::new(), Some(quota_bytes), None)
    }

    /// File-backed store. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> TetherResult<Self> {
        Self::open_with_quota(path, None)
    }

    pub fn open_with_quota(path: impl Into<PathBuf>, quota_bytes: Option<usize>) -> TetherResult<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "opened storage file");
        Ok(Self::build(entries, quota_bytes, Some(path)))
    }

    pub fn from_config(config: &StorageConfig) -> TetherResult<Self> {
        match &config.path {
            Some(path) => Self::open_with_quota(path.clone(), config.quota_bytes),
            None => Ok(Self::build(BTreeMap::new(), config.quota_bytes, None)),
        }
    }

    /// A new execution context sharing this store.
    pub fn context(&self) -> StoreContext {
        StoreContext {
            hub: self.clone(),
            id: self.inner.next_context.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner.entries.read().clone()
    }

    /// Number of accepted `set_item` calls, including unchanged writes.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Current size in bytes as counted against the quota.
    pub fn usage_bytes(&self) -> usize {
        usage(&self.inner.entries.read())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.entries.read().get(key).cloned()
    }

    fn set(&self, origin: ContextId, key: &str, value: &str) -> Result<(), StorageError> {
        let event = {
            let mut entries = self.inner.entries.write();
            let old = entries.get(key).cloned();
            if old.as_deref() == Some(value) {
                self.inner.writes.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }

            if let Some(quota) = self.inner.quota_bytes {
                let current = usage(&entries) - old.as_ref().map_or(0, |v| key.len() + v.len());
                let needed = current + key.len() + value.len();
                if needed > quota {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        needed,
                        quota,
                    });
                }
            }

            entries.insert(key.to_string(), value.to_string());
            if let Err(message) = self.persist(&entries) {
                match &old {
                    Some(previous) => entries.insert(key.to_string(), previous.clone()),
                    None => entries.remove(key),
                };
                return Err(StorageError::Persist {
                    key: key.to_string(),
                    message,
                });
            }
            self.inner.writes.fetch_add(1, Ordering::SeqCst);

            StorageEvent {
                key: Some(key.to_string()),
                old_value: old,
                new_value: Some(value.to_string()),
            }
        };
        self.notify(origin, &event);
        Ok(())
    }

    fn remove(&self, origin: ContextId, key: &str) -> Result<(), StorageError> {
        let event = {
            let mut entries = self.inner.entries.write();
            let Some(old) = entries.remove(key) else {
                return Ok(());
            };
            if let Err(message) = self.persist(&entries) {
                entries.insert(key.to_string(), old);
                return Err(StorageError::Persist {
                    key: key.to_string(),
                    message,
                });
            }
            StorageEvent {
                key: Some(key.to_string()),
                old_value: Some(old),
                new_value: None,
            }
        };
        self.notify(origin, &event);
        Ok(())
    }

    fn clear(&self, origin: ContextId) -> Result<(), StorageError> {
        {
            let mut entries = self.inner.entries.write();
            if entries.is_empty() {
                return Ok(());
            }
            let previous = std::mem::take(&mut *entries);
            if let Err(message) = self.persist(&entries) {
                *entries = previous;
                return Err(StorageError::Persist {
                    key: "*".to_string(),
                    message,
                });
            }
        }
        self.notify(
            origin,
            &StorageEvent {
                key: None,
                old_value: None,
                new_value: None,
            },
        );
        Ok(())
    }

    fn watch(&self, context: ContextId, listener: Arc<StorageListener>) -> WatchGuard {
        let id = self.inner.next_watch.fetch_add(1, Ordering::Relaxed);
        self.inner.watchers.lock().push(Watcher {
            id,
            context,
            listener,
        });

        let weak: Weak<HubInner> = Arc::downgrade(&self.inner);
        WatchGuard::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.watchers.lock().retain(|w| w.id != id);
            }
        })
    }

    fn watcher_count(&self) -> usize {
        self.inner.watchers.lock().len()
    }

    fn notify(&self, origin: ContextId, event: &StorageEvent) {
        let targets: Vec<Arc<StorageListener>> = self
            .inner
            .watchers
            .lock()
            .iter()
            .filter(|w| w.context != origin)
            .map(|w| Arc::clone(&w.listener))
            .collect();
        for listener in targets {
            listener(event);
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), String> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(entries).map_err(|e| e.to_string())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::write(path, content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to persist storage file");
            e.to_string()
        })
    }
}

fn usage(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

fn load_entries(path: &Path) -> TetherResult<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path).map_err(|e| {
        TetherError::io_with_path(format!("Failed to read storage file: {}", e), path.display().to_string())
    })?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&content).map_err(|e| {
        TetherError::config_with_context(
            format!("Failed to parse storage file: {}", e),
            format!("Loading storage entries from '{}'", path.display()),
        )
    })
}

/// One execution context's handle on a [`StorageHub`].
#[derive(Debug, Clone)]
pub struct StoreContext {
    hub: StorageHub,
    id: ContextId,
}

impl StoreContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn hub(&self) -> &StorageHub {
        &self.hub
    }

    /// Remove every key. Other contexts see a notification with no key.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.hub.clear(self.id)
    }

    pub fn keys(&self) -> Vec<String> {
        self.hub.inner.entries.read().keys().cloned().collect()
    }

    /// Watchers registered on the hub across all contexts.
    pub fn watcher_count(&self) -> usize {
        self.hub.watcher_count()
    }
}

impl KeyValueStore for StoreContext {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.hub.get(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.hub.set(self.id, key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.hub.remove(self.id, key)
    }

    fn watch(&self, listener: Arc<StorageListener>) -> WatchGuard {
        self.hub.watch(self.id, listener)
    }
}
