//! Link repository implementations.
//!
//! - [`InMemoryLinkRepository`] - process-local store used by the service binary and tests

mod in_memory_link_repository;

pub use in_memory_link_repository::InMemoryLinkRepository;
