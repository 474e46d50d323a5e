//! Short code → original URL cache used on the redirect path.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::ttl_cache::TtlCache;
use crate::utils::clock::{Clock, SystemClock};

/// Cached mapping for a single short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrlCacheRecord {
    pub short_code: String,
    pub original_url: String,
    pub cached_at: DateTime<Utc>,
}

/// Snapshot of the cache's invalidation counter.
///
/// Taken before a repository lookup and handed back to
/// [`ShortUrlCache::set_if_current`], which refuses the write if any
/// invalidation happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeneration(u64);

/// Cache of resolved short links.
///
/// Residency of an entry is bounded by both the configured default TTL and the
/// link's own expiry, whichever comes first. Links that never expire still
/// leave the cache after `default_ttl`, so an out-of-band deletion is picked
/// up eventually even if the invalidation was missed.
pub struct ShortUrlCache {
    cache: TtlCache<String, ShortUrlCacheRecord>,
    default_ttl: Duration,
    generation: Mutex<u64>,
}

impl ShortUrlCache {
    /// Creates a cache of at most `max_entries` links.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_entries, default_ttl, Arc::new(SystemClock))
    }

    /// Creates a cache whose entry expiry is tracked against `clock`.
    ///
    /// `clock` only drives residency. A link's `expires_at` is a wall-clock
    /// timestamp, so [`set`](Self::set) compares it against `Utc::now()`;
    /// use [`set_at`](Self::set_at) to supply that instant explicitly.
    pub fn with_clock(max_entries: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: TtlCache::with_clock(max_entries, clock),
            default_ttl,
            generation: Mutex::new(0),
        }
    }

    /// Looks up a cached link.
    pub fn get(&self, short_code: &str) -> Option<ShortUrlCacheRecord> {
        self.cache.get(short_code)
    }

    /// Caches `original_url` under `short_code`.
    ///
    /// Returns `false` without caching anything when `expires_at` has already
    /// passed. Callers are expected not to cache expired links in the first place.
    pub fn set(
        &self,
        short_code: &str,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> bool {
        self.set_at(short_code, original_url, expires_at, Utc::now())
    }

    /// Like [`set`](Self::set), with `now` as the wall-clock instant the
    /// link's expiry is measured from.
    pub fn set_at(
        &self,
        short_code: &str,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(ttl) = self.effective_ttl(expires_at, now) else {
            return false;
        };

        let record = ShortUrlCacheRecord {
            short_code: short_code.to_string(),
            original_url: original_url.to_string(),
            cached_at: now,
        };
        self.cache.set(short_code.to_string(), record, ttl);
        true
    }

    /// Current invalidation counter, to pass to [`set_if_current`](Self::set_if_current).
    pub fn generation(&self) -> CacheGeneration {
        CacheGeneration(*self.lock_generation())
    }

    /// Caches the link only if nothing was invalidated since `generation`
    /// was taken.
    ///
    /// Returns `false` when the write was skipped, either because of an
    /// intervening invalidation or because the link has already expired.
    pub fn set_if_current(
        &self,
        generation: CacheGeneration,
        short_code: &str,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> bool {
        let current = self.lock_generation();
        if *current != generation.0 {
            return false;
        }
        self.set(short_code, original_url, expires_at)
    }

    /// Drops the cached entry for `short_code`, if any.
    ///
    /// Also bumps the invalidation counter, so lookups that started before
    /// this call cannot write a stale entry back.
    pub fn invalidate(&self, short_code: &str) -> bool {
        let mut generation = self.lock_generation();
        *generation = generation.wrapping_add(1);
        self.cache.delete(short_code)
    }

    pub fn clear(&self) {
        let mut generation = self.lock_generation();
        *generation = generation.wrapping_add(1);
        self.cache.clear();
    }

    /// Removes expired entries; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.cache.max_size()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// TTL an entry would get at `now`: `min(default_ttl, expires_at - now)`.
    ///
    /// `None` when `expires_at` is not in the future.
    pub fn effective_ttl(
        &self,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        match expires_at {
            None => Some(self.default_ttl),
            Some(at) => match (at - now).to_std() {
                Ok(remaining) if !remaining.is_zero() => Some(remaining.min(self.default_ttl)),
                _ => None,
            },
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
