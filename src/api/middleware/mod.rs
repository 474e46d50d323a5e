//! HTTP middleware for request admission and observability.

pub mod rate_limit;
pub mod tracing;
