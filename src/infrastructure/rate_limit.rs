//! Fixed-window request counter keyed by client identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::utils::clock::{Clock, SystemClock};

/// Longest window a limiter will use. Larger periods are clamped.
const MAX_PERIOD: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Request count for one key inside the current window.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_end: Instant,
}

/// Outcome of a single [`RateLimiter::allow`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests still admitted in the current window.
    pub remaining: u32,
    pub limit: u32,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

impl RateDecision {
    /// Whole seconds a rejected client should wait, rounded up, at least 1.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

/// Per-key fixed-window rate limiter.
///
/// Each key gets `limit` requests per `period`. The window starts on the first
/// request for the key and resets on the first request after it ends. A
/// rejected request does not consume quota.
///
/// Window boundaries are hard: a client can spend its full quota at the end of
/// one window and again at the start of the next, so up to `2 × limit`
/// requests can pass in a short interval around a boundary.
///
/// Keys are opaque; deriving them from IPs or API keys is the caller's job.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use url_shortener_core::infrastructure::rate_limit::RateLimiter;
///
/// let limiter = RateLimiter::new(2, Duration::from_secs(60));
/// assert_eq!(limiter.allow("ip:1.2.3.4").remaining, 1);
/// assert_eq!(limiter.allow("ip:1.2.3.4").remaining, 0);
/// assert!(!limiter.allow("ip:1.2.3.4").allowed);
/// ```
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
    limit: u32,
    period: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Creates a limiter admitting `limit` requests per `period` for each key.
    pub fn new(limit: u32, period: Duration) -> Self {
        Self::with_clock(limit, period, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, period: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            period: period.min(MAX_PERIOD),
            clock,
        }
    }

    /// Records a request for `key` and decides whether to admit it.
    pub fn allow(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let mut windows = self.lock();

        let window = match windows.get_mut(key) {
            Some(window) if now < window.window_end => window,
            Some(window) => {
                *window = self.fresh_window(now);
                return self.admitted(window, now);
            }
            None => {
                let window = windows
                    .entry(key.to_string())
                    .or_insert_with(|| self.fresh_window(now));
                return self.admitted(window, now);
            }
        };

        if window.count >= self.limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
                limit: self.limit,
                reset_after: window.window_end - now,
            };
        }

        window.count += 1;
        self.admitted(window, now)
    }

    /// Forgets `key`, restoring its full quota.
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drops every window that has already ended. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, window| now < window.window_end);
        before - windows.len()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn fresh_window(&self, now: Instant) -> RateWindow {
        RateWindow {
            count: 1,
            window_end: now + self.period,
        }
    }

    fn admitted(&self, window: &RateWindow, now: Instant) -> RateDecision {
        RateDecision {
            allowed: true,
            remaining: self.limit.saturating_sub(window.count),
            limit: self.limit,
            reset_after: window.window_end.saturating_duration_since(now),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateWindow>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
