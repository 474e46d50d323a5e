//! Link creation, resolution and lifecycle service.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::services::code_allocator::{AllocationError, CodeAllocator};
use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::ShortUrlCache;
use crate::utils::code_generator::validate_custom_code;
use crate::utils::url_normalizer::normalize_url;

/// Longest expiry accepted on creation, ten years.
pub const MAX_EXPIRE_IN_HOURS: u32 = 24 * 365 * 10;

/// Service for creating, resolving and managing shortened links.
///
/// Redirect lookups go through the [`ShortUrlCache`] first and fall back to
/// the repository on a miss, writing the result back. Every mutation that
/// makes a link unreachable invalidates its cache entry, and a write-back
/// from a lookup that overlapped such an invalidation is discarded.
pub struct LinkService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    allocator: CodeAllocator<L>,
    cache: Arc<ShortUrlCache>,
    base_url: String,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a new link service.
    ///
    /// `base_url` is the public prefix short URLs are built from; a trailing
    /// slash is ignored.
    pub fn new(
        repository: Arc<L>,
        allocator: CodeAllocator<L>,
        cache: Arc<ShortUrlCache>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            repository,
            allocator,
            cache,
            base_url,
        }
    }

    /// Creates a short link for `long_url`.
    ///
    /// # Code Selection
    ///
    /// - If `custom_code` is provided, validates it and fails with a conflict
    ///   when it is taken
    /// - Otherwise allocates a random code; allocation and insert share one
    ///   critical section
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - URL is invalid or not http(s)
    /// - Custom code is invalid
    /// - `expire_in_hours` is zero or too large
    ///
    /// Returns [`AppError::Conflict`] if the custom code already exists.
    /// Returns [`AppError::CodeGeneration`] if no free code was found.
    pub async fn create_short_link(
        &self,
        long_url: String,
        custom_code: Option<String>,
        expire_in_hours: Option<u32>,
    ) -> Result<Link, AppError> {
        let normalized_url = normalize_url(&long_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let expires_at = match expire_in_hours {
            None => None,
            Some(hours) if hours == 0 || hours > MAX_EXPIRE_IN_HOURS => {
                return Err(AppError::bad_request(
                    "expire_in_hours out of range",
                    json!({ "min": 1, "max": MAX_EXPIRE_IN_HOURS, "provided": hours }),
                ));
            }
            Some(hours) => Some(Utc::now() + ChronoDuration::hours(i64::from(hours))),
        };

        let link = match custom_code {
            Some(custom) => {
                validate_custom_code(&custom)?;

                if self.repository.exists(&custom).await? {
                    return Err(AppError::conflict(
                        "Custom code already exists",
                        json!({ "code": custom }),
                    ));
                }

                self.repository
                    .create(NewLink {
                        code: custom,
                        long_url: normalized_url,
                        expires_at,
                    })
                    .await?
            }
            None => {
                let repository = Arc::clone(&self.repository);
                let result = self
                    .allocator
                    .allocate_with(move |code| async move {
                        repository
                            .create(NewLink {
                                code,
                                long_url: normalized_url,
                                expires_at,
                            })
                            .await
                    })
                    .await;

                if let Err(AllocationError::Exhausted {
                    attempts,
                    random_failures,
                }) = &result
                {
                    metrics::counter!("code_allocation_exhausted_total").increment(1);
                    warn!(
                        attempts,
                        random_failures, "Short code allocation exhausted its retry budget"
                    );
                }

                result?
            }
        };

        info!(code = %link.code, "Created short link");
        Ok(link)
    }

    /// Resolves a short code to the URL it redirects to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown, deleted or
    /// deactivated. Returns [`AppError::Gone`] if the link has expired.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if let Some(record) = self.cache.get(code) {
            metrics::counter!("cache_hits_total").increment(1);
            debug!("Cache HIT for {}", code);
            return Ok(record.original_url);
        }

        metrics::counter!("cache_misses_total").increment(1);
        debug!("Cache MISS for {}", code);

        let generation = self.cache.generation();
        let link = self.find_live(code).await?;

        if !link.is_active {
            self.cache.invalidate(code);
            return Err(not_found(code));
        }

        if link.is_expired() {
            self.cache.invalidate(code);
            return Err(AppError::gone(
                "Short link has expired",
                json!({ "code": code, "expired_at": link.expires_at }),
            ));
        }

        if !self
            .cache
            .set_if_current(generation, &link.code, &link.long_url, link.expires_at)
        {
            debug!("Skipped cache write-back for {}", code);
        }
        Ok(link.long_url)
    }

    /// Returns a link's details, inactive and expired links included.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or deleted.
    pub async fn get_link(&self, code: &str) -> Result<Link, AppError> {
        self.find_live(code).await
    }

    /// Soft-deletes a link and drops it from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or already deleted.
    pub async fn delete_link(&self, code: &str) -> Result<(), AppError> {
        let deleted = self.repository.soft_delete(code).await?;
        self.cache.invalidate(code);

        if !deleted {
            return Err(not_found(code));
        }

        info!(code, "Deleted short link");
        Ok(())
    }

    /// Activates or deactivates a link.
    ///
    /// The cache entry is dropped either way; an activated link is cached
    /// again on its next resolution.
    pub async fn set_link_active(&self, code: &str, active: bool) -> Result<Link, AppError> {
        let link = self.repository.set_active(code, active).await?;
        self.cache.invalidate(code);

        info!(code, active, "Changed short link status");
        Ok(link)
    }

    /// Removes expired links from the store and drops their cache entries.
    ///
    /// Returns how many links were removed.
    pub async fn purge_expired_links(&self) -> Result<usize, AppError> {
        let purged = self.repository.purge_expired(Utc::now()).await?;
        for code in &purged {
            self.cache.invalidate(code);
        }

        if !purged.is_empty() {
            info!(count = purged.len(), "Purged expired short links");
        }
        Ok(purged.len())
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    pub fn cache(&self) -> &ShortUrlCache {
        &self.cache
    }

    async fn find_live(&self, code: &str) -> Result<Link, AppError> {
        self.repository
            .find_by_code(code)
            .await?
            .filter(|link| !link.is_deleted())
            .ok_or_else(|| not_found(code))
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::persistence::InMemoryLinkRepository;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn cache() -> Arc<ShortUrlCache> {
        Arc::new(ShortUrlCache::new(100, Duration::from_secs(3600)))
    }

    fn service_with_mock(repo: MockLinkRepository) -> LinkService<MockLinkRepository> {
        service_with_mock_and_cache(repo, cache())
    }

    fn service_with_mock_and_cache(
        repo: MockLinkRepository,
        cache: Arc<ShortUrlCache>,
    ) -> LinkService<MockLinkRepository> {
        let repo = Arc::new(repo);
        let allocator = CodeAllocator::new(repo.clone(), 6, 10);
        LinkService::new(repo, allocator, cache, "https://s.example.com/")
    }

    fn in_memory_service() -> (LinkService<InMemoryLinkRepository>, Arc<InMemoryLinkRepository>) {
        let repo = Arc::new(InMemoryLinkRepository::new());
        let allocator = CodeAllocator::new(repo.clone(), 6, 10);
        let service = LinkService::new(repo.clone(), allocator, cache(), "https://s.example.com");
        (service, repo)
    }

    /// In-memory store whose next `find_by_code` pauses after reading, until
    /// released.
    #[derive(Default)]
    struct PausingRepository {
        inner: InMemoryLinkRepository,
        armed: AtomicBool,
        paused: Notify,
        release: Notify,
    }

    #[async_trait]
    impl LinkRepository for PausingRepository {
        async fn exists(&self, code: &str) -> Result<bool, AppError> {
            self.inner.exists(code).await
        }

        async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
            self.inner.create(new_link).await
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
            let found = self.inner.find_by_code(code).await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.paused.notify_one();
                self.release.notified().await;
            }
            Ok(found)
        }

        async fn soft_delete(&self, code: &str) -> Result<bool, AppError> {
            self.inner.soft_delete(code).await
        }

        async fn set_active(&self, code: &str, active: bool) -> Result<Link, AppError> {
            self.inner.set_active(code, active).await
        }

        async fn increment_clicks(&self, code: &str) -> Result<bool, AppError> {
            self.inner.increment_clicks(code).await
        }

        async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError> {
            self.inner.purge_expired(now).await
        }
    }

    fn pausing_service() -> (
        Arc<LinkService<PausingRepository>>,
        Arc<PausingRepository>,
    ) {
        let repo = Arc::new(PausingRepository::default());
        let allocator = CodeAllocator::new(repo.clone(), 6, 10);
        let service = LinkService::new(repo.clone(), allocator, cache(), "https://s.example.com");
        (Arc::new(service), repo)
    }

    fn test_link(code: &str, url: &str) -> Link {
        Link::from_new(
            NewLink {
                code: code.to_string(),
                long_url: url.to_string(),
                expires_at: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_short_link_success() {
        let (service, repo) = in_memory_service();

        let link = service
            .create_short_link("https://example.com".to_string(), None, None)
            .await
            .unwrap();

        assert_eq!(link.long_url, "https://example.com/");
        assert_eq!(link.code.len(), 6);
        assert!(link.expires_at.is_none());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_create_short_link_normalizes_url() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_exists().times(1).returning(|_| Ok(false));
        mock_repo
            .expect_create()
            .withf(|new_link| new_link.long_url == "https://example.com/path")
            .times(1)
            .returning(|new_link| Ok(Link::from_new(new_link, Utc::now())));

        let service = service_with_mock(mock_repo);

        let result = service
            .create_short_link("https://EXAMPLE.COM:443/path#frag".to_string(), None, None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_short_link_invalid_url() {
        let service = service_with_mock(MockLinkRepository::new());

        let result = service
            .create_short_link("not-a-url".to_string(), None, None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_with_custom_code() {
        let (service, _) = in_memory_service();

        let link = service
            .create_short_link(
                "https://example.com".to_string(),
                Some("my-link".to_string()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(link.code, "my-link");
    }

    #[tokio::test]
    async fn test_create_short_link_custom_code_conflict() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_exists()
            .withf(|code| code == "taken")
            .times(1)
            .returning(|_| Ok(true));
        mock_repo.expect_create().times(0);

        let service = service_with_mock(mock_repo);

        let result = service
            .create_short_link(
                "https://example.com".to_string(),
                Some("taken".to_string()),
                None,
            )
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_reserved_custom_code() {
        let service = service_with_mock(MockLinkRepository::new());

        let result = service
            .create_short_link(
                "https://example.com".to_string(),
                Some("health".to_string()),
                None,
            )
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_sets_expiry() {
        let (service, _) = in_memory_service();
        let before = Utc::now();

        let link = service
            .create_short_link("https://example.com".to_string(), None, Some(24))
            .await
            .unwrap();

        let expires_at = link.expires_at.unwrap();
        assert!(expires_at >= before + ChronoDuration::hours(24));
        assert!(expires_at <= Utc::now() + ChronoDuration::hours(24));
    }

    #[tokio::test]
    async fn test_create_short_link_rejects_zero_expiry() {
        let service = service_with_mock(MockLinkRepository::new());

        let result = service
            .create_short_link("https://example.com".to_string(), None, Some(0))
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_exhausted_allocation() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_exists().times(10).returning(|_| Ok(true));
        mock_repo.expect_create().times(0);

        let service = service_with_mock(mock_repo);

        let result = service
            .create_short_link("https://example.com".to_string(), None, None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::CodeGeneration { .. }));
    }

    #[tokio::test]
    async fn test_resolve_populates_cache() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(test_link(code, "https://example.com/a"))));

        let cache = cache();
        let service = service_with_mock_and_cache(mock_repo, cache.clone());

        assert_eq!(service.resolve("abc123").await.unwrap(), "https://example.com/a");
        // Second lookup is served from the cache; the mock allows one call only.
        assert_eq!(service.resolve("abc123").await.unwrap(), "https://example.com/a");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().returning(|_| Ok(None));

        let service = service_with_mock(mock_repo);

        let result = service.resolve("missing").await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_link_is_gone() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().returning(|code| {
            let mut link = test_link(code, "https://example.com");
            link.expires_at = Some(Utc::now() - ChronoDuration::minutes(1));
            Ok(Some(link))
        });

        let cache = cache();
        let service = service_with_mock_and_cache(mock_repo, cache.clone());

        let result = service.resolve("old").await;
        assert!(matches!(result.unwrap_err(), AppError::Gone { .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_inactive_link_is_not_found() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().returning(|code| {
            let mut link = test_link(code, "https://example.com");
            link.is_active = false;
            Ok(Some(link))
        });

        let service = service_with_mock(mock_repo);

        let result = service.resolve("paused").await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_repository_error_propagates() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let service = service_with_mock(mock_repo);

        let result = service.resolve("abc").await;
        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_delete_link_invalidates_cache() {
        let (service, _) = in_memory_service();
        let link = service
            .create_short_link("https://example.com".to_string(), None, None)
            .await
            .unwrap();

        service.resolve(&link.code).await.unwrap();
        assert_eq!(service.cache().len(), 1);

        service.delete_link(&link.code).await.unwrap();

        assert!(service.cache().is_empty());
        assert!(matches!(
            service.resolve(&link.code).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
        assert!(matches!(
            service.delete_link(&link.code).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_deactivate_then_reactivate() {
        let (service, _) = in_memory_service();
        let link = service
            .create_short_link("https://example.com".to_string(), None, None)
            .await
            .unwrap();

        service.resolve(&link.code).await.unwrap();

        let updated = service.set_link_active(&link.code, false).await.unwrap();
        assert!(!updated.is_active);
        assert!(service.cache().is_empty());
        assert!(service.resolve(&link.code).await.is_err());

        service.set_link_active(&link.code, true).await.unwrap();
        assert_eq!(
            service.resolve(&link.code).await.unwrap(),
            "https://example.com/"
        );
    }

    #[tokio::test]
    async fn test_get_link_includes_inactive() {
        let (service, _) = in_memory_service();
        let link = service
            .create_short_link("https://example.com".to_string(), None, None)
            .await
            .unwrap();
        service.set_link_active(&link.code, false).await.unwrap();

        let fetched = service.get_link(&link.code).await.unwrap();
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn test_delete_during_lookup_is_not_undone_by_cache_write() {
        let (service, repo) = pausing_service();
        let link = service
            .create_short_link("https://x.example".to_string(), None, None)
            .await
            .unwrap();

        repo.armed.store(true, Ordering::SeqCst);
        let lookup = tokio::spawn({
            let service = service.clone();
            let code = link.code.clone();
            async move { service.resolve(&code).await }
        });

        repo.paused.notified().await;
        service.delete_link(&link.code).await.unwrap();
        repo.release.notify_one();

        // The overlapping lookup read the row before the delete.
        assert_eq!(lookup.await.unwrap().unwrap(), "https://x.example/");
        assert!(service.cache().is_empty());
        assert!(matches!(
            service.resolve(&link.code).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_deactivate_during_lookup_is_not_undone_by_cache_write() {
        let (service, repo) = pausing_service();
        let link = service
            .create_short_link("https://x.example".to_string(), None, None)
            .await
            .unwrap();

        repo.armed.store(true, Ordering::SeqCst);
        let lookup = tokio::spawn({
            let service = service.clone();
            let code = link.code.clone();
            async move { service.resolve(&code).await }
        });

        repo.paused.notified().await;
        service.set_link_active(&link.code, false).await.unwrap();
        repo.release.notify_one();

        lookup.await.unwrap().unwrap();
        assert!(service.cache().get(&link.code).is_none());
        assert!(service.resolve(&link.code).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_expired_links_drops_store_and_cache_entries() {
        let (service, repo) = in_memory_service();
        let live = service
            .create_short_link("https://example.com/live".to_string(), None, None)
            .await
            .unwrap();
        repo.create(NewLink {
            code: "stale1".to_string(),
            long_url: "https://example.com/stale".to_string(),
            expires_at: Some(Utc::now() - ChronoDuration::minutes(1)),
        })
        .await
        .unwrap();

        service.resolve(&live.code).await.unwrap();
        // Simulates an entry cached just before the link expired.
        service
            .cache()
            .set("stale1", "https://example.com/stale", None);

        assert_eq!(service.purge_expired_links().await.unwrap(), 1);

        assert_eq!(repo.len(), 1);
        assert!(service.cache().get("stale1").is_none());
        assert!(service.cache().get(&live.code).is_some());
        assert_eq!(service.purge_expired_links().await.unwrap(), 0);
    }

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let service = service_with_mock(MockLinkRepository::new());
        assert_eq!(service.short_url("abc123"), "https://s.example.com/abc123");
    }
}
