//! Store Module
//!
//! The shared in-memory keyspace.
//!
//! ## Concurrency Model
//! The keyspace is striped across a fixed number of shards, each a
//! `HashMap` behind its own `RwLock`:
//! - A key always hashes to the same shard of a given store; the hash is
//!   seeded per store, so clients cannot aim keys at one stripe
//! - GETs on one shard run concurrently, SETs take the shard's write lock
//! - A lock is held only for the map operation itself, never across I/O

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};

use bytes::Bytes;
use parking_lot::RwLock;

type Shard = RwLock<HashMap<Bytes, Bytes>>;

/// Concurrent-safe mapping from key to value
pub struct Store {
    shards: Box<[Shard]>,

    /// `shards.len() - 1`, valid because the count is a power of two
    mask: usize,

    /// Per-store seed for shard selection
    hasher: RandomState,
}

impl Store {
    pub const DEFAULT_SHARDS: usize = 16;

    /// Create an empty store with the default shard count
    pub fn new() -> Self {
        Self::with_shards(Self::DEFAULT_SHARDS)
    }

    /// Create an empty store with `shards` lock stripes
    ///
    /// The count is rounded up to the next power of two (minimum 1).
    pub fn with_shards(shards: usize) -> Self {
        let count = shards.max(1).next_power_of_two();
        let shards = (0..count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            mask: count - 1,
            hasher: RandomState::new(),
        }
    }

    /// Get a value by key (shard read lock)
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.shard(key).read().get(key).cloned()
    }

    /// Insert or overwrite a value (shard write lock)
    pub fn set(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();
        self.shard(&key).write().insert(key, value);
    }

    /// Number of keys across all shards
    ///
    /// Shards are read one after another, so the total is only a snapshot
    /// while writers are active.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`
    pub fn shard_of(&self, key: &[u8]) -> usize {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        hasher.finish() as usize & self.mask
    }

    fn shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_of(key)]
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
