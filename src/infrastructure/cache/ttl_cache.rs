//! Generic in-memory cache with per-entry expiry and bounded capacity.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::utils::clock::{Clock, SystemClock};

/// Longest TTL an entry can carry. Larger values are clamped.
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// A stored value together with its expiry.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    /// Insertion sequence, used to break expiry ties deterministically.
    seq: u64,
}

#[derive(Debug)]
struct Store<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    next_seq: u64,
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Removes the entry expiring first; the earliest inserted one wins ties.
    fn evict_earliest_expiry(&mut self) -> Option<K> {
        let victim = self
            .map
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at, entry.seq))
            .map(|(key, _)| key.clone())?;

        self.map.remove(&victim);
        Some(victim)
    }
}

/// Thread-safe key-value cache with TTL expiry and earliest-expiry-first eviction.
///
/// Expired entries are never returned. They are removed lazily by [`TtlCache::get`]
/// or in bulk by [`TtlCache::purge_expired`].
///
/// When a new key is inserted into a full cache, the entry with the smallest
/// expiry is evicted. Finding it is an O(n) scan, which is fine while the
/// capacity stays in the low thousands.
///
/// # Consistency
///
/// `get` takes the read lock first and only upgrades to the write lock when it
/// finds an expired entry. Between those two steps another reader may observe
/// the same expired entry and also report a miss. No reader ever receives an
/// expired value.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use url_shortener_core::infrastructure::cache::TtlCache;
///
/// let cache: TtlCache<String, u32> = TtlCache::new(2);
/// cache.set("a".to_string(), 1, Duration::from_secs(60));
/// assert_eq!(cache.get("a"), Some(1));
/// assert_eq!(cache.get("missing"), None);
/// ```
pub struct TtlCache<K, V> {
    store: RwLock<Store<K, V>>,
    max_size: usize,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self::with_clock(max_size, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RwLock::new(Store {
                map: HashMap::with_capacity(max_size.min(1024)),
                next_seq: 0,
            }),
            max_size,
            clock,
        }
    }

    /// Returns a clone of the value for `key` if present and not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();

        {
            let store = self.read();
            match store.map.get(key) {
                None => return None,
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut store = self.write();
        // Another writer may have refreshed the key since the read lock was released.
        if store
            .map
            .get(key)
            .is_some_and(|entry| now >= entry.expires_at)
        {
            store.map.remove(key);
        }

        None
    }

    /// Inserts or overwrites `key`, expiring after `ttl`.
    ///
    /// If `key` is new and the cache is full, one entry is evicted first.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        if self.max_size == 0 {
            return;
        }

        let expires_at = self.clock.now() + ttl.min(MAX_TTL);

        let mut store = self.write();
        if !store.map.contains_key(&key) && store.map.len() >= self.max_size {
            store.evict_earliest_expiry();
        }

        let seq = store.next_seq;
        store.next_seq += 1;
        store.map.insert(
            key,
            CacheEntry {
                value,
                expires_at,
                seq,
            },
        );
    }

    /// Removes `key`. Returns `true` if an entry was present.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write().map.remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.write().map.clear();
    }

    /// Removes all expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.write();
        let before = store.map.len();
        store.map.retain(|_, entry| now < entry.expires_at);
        before - store.map.len()
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().map.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn read(&self) -> RwLockReadGuard<'_, Store<K, V>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store<K, V>> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}
