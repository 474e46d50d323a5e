//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL link with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub clicks: u64,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Builds a fresh, active link from creation input.
    pub fn from_new(new_link: NewLink, created_at: DateTime<Utc>) -> Self {
        Self {
            code: new_link.code,
            long_url: new_link.long_url,
            created_at,
            expires_at: new_link.expires_at,
            clicks: 0,
            is_active: true,
            deleted_at: None,
        }
    }

    /// Returns true if the link has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Whether the link may currently be redirected to.
    pub fn is_available(&self) -> bool {
        self.is_active && !self.is_deleted() && !self.is_expired()
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}
