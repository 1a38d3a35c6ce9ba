use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{Cache, EvictCallback};

/// Simple cache implementation with no eviction policy
///
/// This cache stores all entries without any size limits or eviction.
/// It's best suited for scenarios where memory usage is not a concern
/// and maximum performance is desired.
///
/// The cache tracks entry access time for TTL expiration if configured.
pub struct SimpleCache<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    /// Current entries in the cache
    entries: RwLock<HashMap<K, Arc<V>>>,

    /// Optional callback when an item is removed (not used for eviction)
    evict_callback: Option<EvictCallback<K, V>>,
}

impl<K, V> fmt::Debug for SimpleCache<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries_len = self
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or(0);

        f.debug_struct("SimpleCache")
            .field("entries_len", &entries_len)
            .finish()
    }
}

impl<K, V> SimpleCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static + fmt::Debug,
    V: Clone + Send + Sync + 'static + fmt::Debug,
{
    /// Create a new simple cache
    pub fn new(
        _capacity: usize, // Ignored for simple cache
        evict_callback: Option<EvictCallback<K, V>>,
        _ttl: Option<Duration>, // Ignored for simple cache
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            evict_callback,
        }
    }
}

impl<K, V> Cache<K, V> for SimpleCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static + fmt::Debug,
    V: Clone + Send + Sync + 'static + fmt::Debug,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read().ok()?;
        entries.get(key).cloned()
    }

    fn insert(&self, key: K, value: V) -> bool {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key, Arc::new(value));
                true
            }
            Err(_) => false,
        }
    }

    fn remove(&self, key: &K) -> bool {
        match self.entries.write() {
            Ok(mut entries) => {
                match entries.remove(key) {
                    Some(value) => {
                        // Call eviction callback if provided
                        if let Some(callback) = &self.evict_callback {
                            callback(key, &value);
                        }
                        true
                    }
                    None => false,
                }
            }
            Err(_) => false,
        }
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    fn capacity(&self) -> usize {
        // Simple cache has unlimited capacity
        usize::MAX
    }

    fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => {
                // Call eviction callback for all items if provided
                if let Some(callback) = &self.evict_callback {
                    for (key, value) in entries.iter() {
                        callback(key, value);
                    }
                }

                entries.clear();
            }
            Err(_) => {
                // Unable to acquire lock, nothing to clear
            }
        }
    }

    fn close(&self) {
        self.clear();
    }
}
