//! Persistent key-value synchronization
//!
//! Binds [`ReactiveCell`]s to keys of a host key-value store that is shared
//! by several execution contexts.
//!
//! - [`Codec`]: typed value <-> stored string ([`JsonCodec`] by default).
//! - [`KeyValueStore`]: the host store seen from one context, with change
//!   notifications for writes made by *other* contexts.
//! - [`StorageHub`] / [`StoreContext`]: an in-process host store with optional
//!   JSON file persistence and a byte quota.
//! - [`StorageSync`]: the channel keeping one cell and one key consistent in
//!   both directions.
//!
//! Every read/write cycle is opportunistic: other contexts may write the same
//! key at any time, and failures are recorded on the channel rather than
//! returned to the caller.
//!
//! [`ReactiveCell`]: crate::reactive::ReactiveCell

mod codec;
mod hub;
mod store;
mod sync;

pub use codec::{Codec, CodecError, FnCodec, JsonCodec, RawCodec};
pub use hub::{ContextId, StorageHub, StoreContext};
pub use store::{KeyValueStore, StorageError, StorageEvent, StorageListener, WatchGuard};
pub use sync::{StorageSync, StorageSyncOptions};
