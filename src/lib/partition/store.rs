//! Concurrent partition store with per-partition locking.
//!
//! The map from [`PartitionKey`] to state is split into shards, each behind its own
//! `RwLock`. Lookups of existing partitions take only a shard read lock; creation re-checks
//! under the shard write lock so that exactly one state is ever built per key, even when
//! several workers race on first access. The state itself sits behind a `Mutex` owned by the
//! partition, so mutating one partition never blocks work on another.
//!
//! # Example
//!
//! ```
//! use fgvar_lib::partition::{PartitionKey, PartitionStore};
//!
//! let store: PartitionStore<u64> = PartitionStore::new(1000, |_key| 0);
//! let key = PartitionKey::for_position("chr1", 1500, 1000);
//!
//! store.get_or_create(&key).with(|count| *count += 1);
//! store.get_or_create(&key).with(|count| *count += 1);
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(*store.get_or_create(&key).lock(), 2);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::{AHashMap, RandomState};
use log::trace;
use parking_lot::{Mutex, MutexGuard, RwLock};

use super::PartitionKey;

/// Default number of shards in the key map.
pub const DEFAULT_SHARDS: usize = 64;

/// One partition's state, guarded by a lock local to the partition.
#[derive(Debug)]
pub struct Partition<S> {
    key: PartitionKey,
    state: Mutex<S>,
}

impl<S> Partition<S> {
    #[must_use]
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Locks this partition's state.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }

    /// Runs `f` with exclusive access to this partition's state.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.state.lock();
        f(&mut guard)
    }
}

type Shard<S> = RwLock<AHashMap<PartitionKey, Arc<Partition<S>>>>;
type Factory<S> = Box<dyn Fn(&PartitionKey) -> S + Send + Sync>;

/// Concurrent map of lazily created partition states.
///
/// The store never evicts on its own; callers that need bounded memory remove partitions once
/// the regions covering them are fully merged.
pub struct PartitionStore<S> {
    partition_size: u32,
    shards: Box<[Shard<S>]>,
    hasher: RandomState,
    factory: Factory<S>,
    created: AtomicUsize,
}

impl<S> PartitionStore<S> {
    /// Creates an empty store with [`DEFAULT_SHARDS`] shards.
    ///
    /// # Arguments
    ///
    /// * `partition_size` - Bases per partition (values below 1 are treated as 1)
    /// * `factory` - Builds the initial state for a newly seen key
    #[must_use]
    pub fn new<F>(partition_size: u32, factory: F) -> Self
    where
        F: Fn(&PartitionKey) -> S + Send + Sync + 'static,
    {
        Self::with_shards(partition_size, DEFAULT_SHARDS, factory)
    }

    /// Creates an empty store with an explicit shard count (at least 1).
    #[must_use]
    pub fn with_shards<F>(partition_size: u32, shards: usize, factory: F) -> Self
    where
        F: Fn(&PartitionKey) -> S + Send + Sync + 'static,
    {
        let shards = (0..shards.max(1)).map(|_| RwLock::new(AHashMap::new())).collect();
        Self {
            partition_size: partition_size.max(1),
            shards,
            hasher: RandomState::new(),
            factory: Box::new(factory),
            created: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn partition_size(&self) -> u32 {
        self.partition_size
    }

    /// Key of the partition containing `position` on `chromosome`.
    #[must_use]
    pub fn key_for(&self, chromosome: &str, position: u32) -> PartitionKey {
        PartitionKey::for_position(chromosome, position, self.partition_size)
    }

    fn shard(&self, key: &PartitionKey) -> &Shard<S> {
        let index = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    /// Returns the partition for `key`, creating it on first access.
    ///
    /// Safe to call from any thread; concurrent first accesses to the same key all receive the
    /// same partition.
    pub fn get_or_create(&self, key: &PartitionKey) -> Arc<Partition<S>> {
        let shard = self.shard(key);
        if let Some(partition) = shard.read().get(key) {
            return Arc::clone(partition);
        }

        let mut map = shard.write();
        let partition = map.entry(key.clone()).or_insert_with(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            trace!("Creating partition {key}");
            Arc::new(Partition { key: key.clone(), state: Mutex::new((self.factory)(key)) })
        });
        Arc::clone(partition)
    }

    /// Returns the partition containing `position`, creating it on first access.
    pub fn get_or_create_at(&self, chromosome: &str, position: u32) -> Arc<Partition<S>> {
        self.get_or_create(&self.key_for(chromosome, position))
    }

    /// Returns the partition for `key` if it exists.
    #[must_use]
    pub fn get(&self, key: &PartitionKey) -> Option<Arc<Partition<S>>> {
        self.shard(key).read().get(key).cloned()
    }

    /// Removes a partition. Workers still holding it keep a valid handle.
    pub fn remove(&self, key: &PartitionKey) -> Option<Arc<Partition<S>>> {
        self.shard(key).write().remove(key)
    }

    /// Removes every partition on `chromosome`, returning how many were removed.
    pub fn evict_chromosome(&self, chromosome: &str) -> usize {
        self.evict_where(|key| key.chromosome() == chromosome)
    }

    /// Removes partitions on `chromosome` that end before `position`.
    pub fn evict_before(&self, chromosome: &str, position: u32) -> usize {
        let size = self.partition_size;
        self.evict_where(|key| key.chromosome() == chromosome && key.end(size) < position)
    }

    fn evict_where(&self, predicate: impl Fn(&PartitionKey) -> bool) -> usize {
        let mut removed = 0;
        for shard in &*self.shards {
            let mut map = shard.write();
            let before = map.len();
            map.retain(|key, _| !predicate(key));
            removed += before - map.len();
        }
        removed
    }

    /// Number of partitions currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }

    /// Keys of all partitions currently held, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<PartitionKey> {
        let mut keys: Vec<_> =
            self.shards.iter().flat_map(|s| s.read().keys().cloned().collect::<Vec<_>>()).collect();
        keys.sort();
        keys
    }

    /// Total number of partition states ever created, including evicted ones.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl<S> std::fmt::Debug for PartitionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "partitions({})", self.len())
    }
}
