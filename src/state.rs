//! Shared application state injected into every handler.

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::services::LinkService;
use crate::domain::click_event::ClickSender;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::ShortUrlCache;
use crate::infrastructure::rate_limit::RateLimiter;

/// Handles to the services and in-process components, built once by
/// [`crate::server::build_state`].
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub cache: Arc<ShortUrlCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub click_sender: ClickSender,
    /// Paths exempt from rate limiting, matched exactly.
    pub rate_limit_excluded: Arc<HashSet<String>>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for the client address.
    pub behind_proxy: bool,
}
