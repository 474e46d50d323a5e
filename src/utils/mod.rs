//! Helpers shared across layers.
//!
//! - [`clock`] - Injectable monotonic clock
//! - [`code_generator`] - Short code generation and custom code validation
//! - [`url_normalizer`] - Target URL validation and canonical form
//! - [`client_identity`] - Rate limit key derivation from request headers

pub mod client_identity;
pub mod clock;
pub mod code_generator;
pub mod url_normalizer;
