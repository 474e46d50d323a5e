//! Short code generation and validation utilities.
//!
//! Provides cryptographically secure random code generation and validation
//! for custom user-provided codes.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::error::AppError;

/// Characters a generated code is drawn from.
pub const BASE62_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bytes at or above this value are rejected so every symbol is equally likely.
const ACCEPT_BELOW: u8 = 248; // 62 * 4

/// Refills allowed per buffer's worth of output before giving up.
const REFILLS_PER_BUFFER: usize = 4;

/// Reserved codes that cannot be used as short links.
///
/// These codes are reserved for system endpoints to prevent routing conflicts.
const RESERVED_CODES: &[&str] = &["api", "health", "static", "admin"];

static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid custom code regex"));

/// The secure random source failed to produce bytes.
#[derive(Debug, Clone, thiserror::Error)]
#[error("secure random source failed: {0}")]
pub struct RandomSourceError(pub String);

/// Source of unpredictable bytes for code generation.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomSourceError>;
}

/// Operating system CSPRNG via `getrandom`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomSourceError> {
        getrandom::fill(buf).map_err(|e| RandomSourceError(e.to_string()))
    }
}

/// Generates a random base62 code of `length` characters from the OS CSPRNG.
///
/// # Examples
///
/// ```
/// use url_shortener_core::utils::code_generator::generate_code;
///
/// let code = generate_code(6).unwrap();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code(length: usize) -> Result<String, RandomSourceError> {
    generate_code_with(&OsRandom, length)
}

/// Generates a random base62 code of `length` characters from `source`.
///
/// Each character is drawn independently and uniformly. Random bytes that
/// would bias the distribution are discarded.
///
/// # Errors
///
/// Returns [`RandomSourceError`] if `source` fails. There is no fallback to a
/// predictable generator.
pub fn generate_code_with(
    source: &dyn RandomSource,
    length: usize,
) -> Result<String, RandomSourceError> {
    let mut code = String::with_capacity(length);
    let mut buffer = [0u8; 32];
    let max_refills = length.div_ceil(buffer.len()) * REFILLS_PER_BUFFER + 1;

    for _ in 0..max_refills {
        if code.len() == length {
            return Ok(code);
        }

        source.fill(&mut buffer)?;

        for &byte in buffer.iter().filter(|&&b| b < ACCEPT_BELOW) {
            code.push(BASE62_ALPHABET[usize::from(byte % 62)] as char);
            if code.len() == length {
                break;
            }
        }
    }

    if code.len() == length {
        Ok(code)
    } else {
        Err(RandomSourceError(
            "random source produced too few usable bytes".to_string(),
        ))
    }
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
/// - Cannot be a reserved system code
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any validation rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    if code.len() < 3 || code.len() > 20 {
        return Err(AppError::bad_request(
            "Custom code must be 3-20 characters",
            json!({ "provided_length": code.len() }),
        ));
    }

    if !CUSTOM_CODE_REGEX.is_match(code) {
        return Err(AppError::bad_request(
            "Custom code can only contain letters, digits, hyphens and underscores",
            json!({ "code": code }),
        ));
    }

    if RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
    {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
