//! Process-local implementation of the link repository.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Link store kept in process memory.
///
/// Codes are unique across live and soft-deleted links, mirroring a unique
/// constraint on the code column. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    links: RwLock<HashMap<String, Link>>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links, deleted ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Link>> {
        self.links.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Link>> {
        self.links.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.read().contains_key(code))
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.write();
        if links.contains_key(&new_link.code) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "code": new_link.code }),
            ));
        }

        let link = Link::from_new(new_link, Utc::now());
        links.insert(link.code.clone(), link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.read().get(code).cloned())
    }

    async fn soft_delete(&self, code: &str) -> Result<bool, AppError> {
        let mut links = self.write();
        match links.get_mut(code) {
            Some(link) if !link.is_deleted() => {
                link.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_active(&self, code: &str, active: bool) -> Result<Link, AppError> {
        let mut links = self.write();
        match links.get_mut(code) {
            Some(link) if !link.is_deleted() => {
                link.is_active = active;
                Ok(link.clone())
            }
            _ => Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            )),
        }
    }

    async fn increment_clicks(&self, code: &str) -> Result<bool, AppError> {
        let mut links = self.write();
        match links.get_mut(code) {
            Some(link) => {
                link.clicks += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError> {
        let mut links = self.write();
        let expired: Vec<String> = links
            .values()
            .filter(|link| link.expires_at.is_some_and(|at| at <= now))
            .map(|link| link.code.clone())
            .collect();

        for code in &expired {
            links.remove(code);
        }
        Ok(expired)
    }
}
