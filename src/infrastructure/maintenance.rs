//! Background sweeps that keep in-process state bounded.
//!
//! Correctness never depends on these tasks: expired cache entries are
//! filtered on read, finished rate windows reset on the next request and
//! expired links answer 410 until removed. They only reclaim memory held by
//! keys that are never touched again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::application::services::LinkService;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::ShortUrlCache;
use crate::infrastructure::rate_limit::RateLimiter;

/// Spawns a task calling [`RateLimiter::cleanup`] every `every`.
///
/// Abort the returned handle on shutdown.
pub fn spawn_rate_limit_cleanup(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting rate limit cleanup every {:?}", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = limiter.cleanup();
            if removed > 0 {
                debug!("Rate limit cleanup: removed {} finished windows", removed);
            }
        }
    })
}

/// Spawns a task calling [`ShortUrlCache::purge_expired`] every `every`.
///
/// Abort the returned handle on shutdown.
pub fn spawn_cache_sweep(cache: Arc<ShortUrlCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting cache sweep every {:?}", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired();
            if removed > 0 {
                debug!("Cache sweep: removed {} expired entries", removed);
            }
        }
    })
}

/// Spawns a task calling [`LinkService::purge_expired_links`] every `every`.
///
/// A failed purge is logged and retried on the next tick.
pub fn spawn_link_purge<L>(service: Arc<LinkService<L>>, every: Duration) -> JoinHandle<()>
where
    L: LinkRepository + ?Sized + 'static,
{
    tokio::spawn(async move {
        info!("Starting expired link purge every {:?}", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if let Err(e) = service.purge_expired_links().await {
                warn!("Expired link purge failed: {}", e);
            }
        }
    })
}
