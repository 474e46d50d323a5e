//! DTOs for the link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Link;

/// Link details returned by `GET` and `PATCH /api/links/{code}`.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub code: String,
    pub short_url: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_expired: bool,
    pub clicks: u64,
}

impl LinkResponse {
    pub fn from_link(link: Link, short_url: String) -> Self {
        let is_expired = link.is_expired();
        Self {
            code: link.code,
            short_url,
            long_url: link.long_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
            is_active: link.is_active,
            is_expired,
            clicks: link.clicks,
        }
    }
}

/// Result of `POST /api/cleanup`.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    /// Expired links removed by this run.
    pub purged: usize,
}

/// Request body for `PATCH /api/links/{code}`.
#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub is_active: bool,
}
