//! Infrastructure layer: in-process state and storage implementations.
//!
//! # Modules
//!
//! - [`cache`] - TTL cache and the short URL cache built on it
//! - [`rate_limit`] - Fixed-window rate limiter
//! - [`persistence`] - Link repository implementations
//! - [`maintenance`] - Periodic sweeps of expired cache entries and rate windows

pub mod cache;
pub mod maintenance;
pub mod persistence;
pub mod rate_limit;
