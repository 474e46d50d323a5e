//! # URL Shortener Core
//!
//! In-process admission, caching and code allocation for a URL shortening
//! service built with Axum.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Link entity, repository trait, click queue and worker
//! - **Application Layer** ([`application`]) - Link service and short code allocator
//! - **Infrastructure Layer** ([`infrastructure`]) - TTL cache, rate limiter, in-memory store
//! - **API Layer** ([`api`]) - REST handlers, DTOs and middleware
//!
//! ## Core Components
//!
//! - [`infrastructure::cache::TtlCache`] - Bounded map with per-entry expiry and
//!   earliest-expiry-first eviction
//! - [`infrastructure::cache::ShortUrlCache`] - Short code to URL cache whose TTL never
//!   outlives the link
//! - [`infrastructure::rate_limit::RateLimiter`] - Per-client fixed-window counter
//! - [`application::services::CodeAllocator`] - Serialized, collision-checked base62
//!   code allocation
//!
//! ## Quick Start
//!
//! ```bash
//! export BASE_URL="https://s.example.com"
//! export RATE_LIMIT_REQUESTS=100
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AllocationError, CodeAllocator, LinkService};
    pub use crate::domain::entities::{Link, NewLink};
    pub use crate::domain::repositories::LinkRepository;
    pub use crate::error::AppError;
    pub use crate::infrastructure::cache::{ShortUrlCache, TtlCache};
    pub use crate::infrastructure::rate_limit::{RateDecision, RateLimiter};
    pub use crate::state::AppState;
    pub use crate::utils::clock::{Clock, ManualClock, SystemClock};
}
