//! Application layer services implementing business logic.
//!
//! Services consume the [`LinkRepository`](crate::domain::repositories::LinkRepository)
//! trait together with the in-process cache and code allocator, and expose a
//! small API to the HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation, resolution and lifecycle
//! - [`services::code_allocator::CodeAllocator`] - Collision-free short code allocation

pub mod services;
