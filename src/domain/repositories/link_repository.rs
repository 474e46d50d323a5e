//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for managing short links.
///
/// This is the durable store the in-process core sits in front of. The code
/// allocator only needs [`LinkRepository::exists`]; the link service uses the
/// rest.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - process-local store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Returns whether `code` is already taken, including by deleted links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be queried.
    async fn exists(&self, code: &str) -> Result<bool, AppError>;

    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code, including deleted and inactive links.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Soft-deletes a link.
    ///
    /// Returns `Ok(true)` if the link was found and deleted, `Ok(false)` if not
    /// found or already deleted.
    async fn soft_delete(&self, code: &str) -> Result<bool, AppError>;

    /// Activates or deactivates a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link matches `code`.
    async fn set_active(&self, code: &str, active: bool) -> Result<Link, AppError>;

    /// Adds one to the click counter. Returns `Ok(false)` if the link is unknown.
    async fn increment_clicks(&self, code: &str) -> Result<bool, AppError>;

    /// Permanently removes every link whose expiry is at or before `now`,
    /// soft-deleted ones included. Their codes become free again.
    ///
    /// Returns the removed codes.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError>;
}
