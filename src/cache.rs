//! Bounded keyed cache with least-recently-used eviction.
//!
//! `BoundedCache` wraps [`lru::LruCache`] and adds a dispose hook: every value
//! that leaves the cache (evicted, replaced, deleted, cleared or dropped with
//! the cache) is handed to the hook exactly once. Owners of native resources
//! use the hook as the single release point.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Callback receiving every entry that leaves the cache.
pub type DisposeHook<K, V> = Box<dyn FnMut(K, V) + Send>;

/// Fixed-capacity mapping with LRU eviction and a dispose hook.
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    dispose: DisposeHook<K, V>,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize, dispose: impl FnMut(K, V) + Send + 'static) -> Self {
        Self {
            entries: LruCache::new(capacity),
            dispose: Box::new(dispose),
        }
    }

    /// Look up a value and mark it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable lookup that marks the entry as most recently used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Lookup that leaves the recency order untouched.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.peek(key)
    }

    /// Mutable lookup that leaves the recency order untouched.
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.peek_mut(key)
    }

    /// Insert or replace a value, marking it as most recently used.
    ///
    /// A replaced value, or the least-recently-used entry evicted to make
    /// room, is passed to the dispose hook before this returns.
    pub fn set(&mut self, key: K, value: V) {
        if let Some((old_key, old_value)) = self.entries.push(key, value) {
            (self.dispose)(old_key, old_value);
        }
    }

    /// Remove an entry, disposing it. Returns whether the key was present.
    pub fn delete(&mut self, key: &K) -> bool {
        match self.entries.pop_entry(key) {
            Some((key, value)) => {
                (self.dispose)(key, value);
                true
            }
            None => false,
        }
    }

    /// Dispose every entry, least recently used first.
    pub fn clear(&mut self) {
        while let Some((key, value)) = self.entries.pop_lru() {
            (self.dispose)(key, value);
        }
    }

    /// Iterate entries from most to least recently used without touching recency.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Mutable iteration over all values without touching recency.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, value)| value)
    }

    /// Snapshot of all values, most recently used first.
    pub fn values(&self) -> Vec<&V> {
        self.entries.iter().map(|(_, value)| value).collect()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.cap()
    }
}

impl<K: Hash + Eq, V> Drop for BoundedCache<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}
