//! Per-key locking for shared caches
//!
//! Readers of the unit cache never take these locks; populating an entry
//! does, so concurrent first accesses to the same unit serialize while
//! different units proceed in parallel.

use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Lazily created lock per key.
pub struct KeyedLockManager<K> {
    locks: RwLock<HashMap<K, Arc<RwLock<()>>>>,
}

impl<K: Eq + Hash> KeyedLockManager<K> {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for `key`.
    pub fn get_lock<Q>(&self, key: &Q) -> Arc<RwLock<()>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(key) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another thread may have inserted it between the two guards.
        map.entry(key.to_owned())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Drop the lock for `key` once no caller holds it.
    pub fn release<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.locks.write();
        if map.get(key).map(|l| Arc::strong_count(l) == 1).unwrap_or(false) {
            map.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash> Default for KeyedLockManager<K> {
    fn default() -> Self {
        Self::new()
    }
}
