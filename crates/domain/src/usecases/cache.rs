//! Bounded LRU cache and the read-through cache for externally fetched posts

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use crate::ports::{FetchError, StatusFetcher};

/// Default number of externally fetched posts kept in memory
pub const DEFAULT_EXTERNAL_CACHE_CAPACITY: usize = 1024;

/// Fixed-capacity map evicting the least recently used entry.
///
/// Not synchronized; wrap it in a lock to share it.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<K, (V, u64)>,
    recency: BTreeMap<u64, K>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    /// Look up an entry, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<V> {
        let tick = self.next_tick();
        let (value, last_used) = self.entries.get_mut(key)?;
        self.recency.remove(&*last_used);
        *last_used = tick;
        self.recency.insert(tick, key.clone());
        Some(value.clone())
    }

    /// Insert or replace an entry; returns the entry evicted to make room
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        let tick = self.next_tick();
        if let Some((_, last_used)) = self.entries.remove(&key) {
            self.recency.remove(&last_used);
        }
        self.entries.insert(key.clone(), (value, tick));
        self.recency.insert(tick, key);

        if self.entries.len() > self.capacity {
            let (_, oldest) = self.recency.pop_first()?;
            let (value, _) = self.entries.remove(&oldest)?;
            return Some((oldest, value));
        }
        None
    }

    /// Remove an entry
    pub fn evict(&mut self, key: &K) -> Option<V> {
        let (value, last_used) = self.entries.remove(key)?;
        self.recency.remove(&last_used);
        Some(value)
    }

    /// Whether an entry is present, without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// Read-through cache in front of the origin platform.
///
/// Safe to share between concurrent requests: the lock only guards the map
/// and is never held across the network call. Two concurrent misses for the
/// same id may both fetch; the later result replaces the earlier one.
/// Failed fetches are neither retried nor cached.
pub struct ExternalFetchCache {
    fetcher: Arc<dyn StatusFetcher>,
    entries: Mutex<LruCache<String, Value>>,
}

impl ExternalFetchCache {
    pub fn new(fetcher: Arc<dyn StatusFetcher>, capacity: usize) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the raw record for `id`, fetching it on a miss
    pub async fn get(&self, id: &str) -> Result<Value, FetchError> {
        let key = id.to_string();
        let cached = self.lock().get(&key);
        if let Some(hit) = cached {
            tracing::debug!(id = %id, "External fetch cache hit");
            return Ok(hit);
        }

        tracing::info!(id = %id, "Fetching post from origin platform");
        let fetched = self.fetcher.fetch_status(id).await?;

        let evicted = self.lock().put(key, fetched.clone());
        if let Some((evicted, _)) = evicted {
            tracing::debug!(evicted = %evicted, "Evicted least recently used post");
        }
        Ok(fetched)
    }

    /// Drop a cached entry
    pub fn evict(&self, id: &str) -> bool {
        self.lock().evict(&id.to_string()).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Value>> {
        // The map stays consistent even if a holder panicked mid-operation.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
