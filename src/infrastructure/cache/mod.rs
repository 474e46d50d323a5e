//! Caching layer for fast redirect lookups.
//!
//! - [`TtlCache`] - generic in-memory cache with expiry and bounded capacity
//! - [`ShortUrlCache`] - short code → original URL cache built on top of it

mod short_url_cache;
mod ttl_cache;

pub use short_url_cache::{CacheGeneration, ShortUrlCache, ShortUrlCacheRecord};
pub use ttl_cache::TtlCache;
