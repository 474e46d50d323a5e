//! Rate limit key derivation from HTTP request metadata.

use std::net::IpAddr;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Header carrying an optional API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Hex characters of the key digest kept in the rate limit key.
const API_KEY_DIGEST_CHARS: usize = 16;

/// Builds the rate limiter key for a request.
///
/// A non-empty `X-API-Key` header yields `apikey:<digest>`, where the digest
/// is a SHA-256 prefix so raw keys never sit in limiter memory. Otherwise the
/// client address yields `ip:<addr>`, and `ip:unknown` if none is available.
///
/// `X-Forwarded-For` and `X-Real-IP` are honoured only when `behind_proxy`
/// is set; they are client-controlled otherwise.
pub fn rate_limit_key(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> String {
    if let Some(api_key) = header_str(headers, API_KEY_HEADER) {
        return format!("apikey:{}", hash_api_key(api_key));
    }

    match client_ip(headers, peer, behind_proxy) {
        Some(ip) => format!("ip:{ip}"),
        None => "ip:unknown".to_string(),
    }
}

/// Resolves the client address, preferring proxy headers when trusted.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> Option<IpAddr> {
    if behind_proxy {
        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse().ok());

        if forwarded.is_some() {
            return forwarded;
        }

        if let Some(ip) = header_str(headers, "x-real-ip").and_then(|v| v.parse().ok()) {
            return Some(ip);
        }
    }

    peer
}

fn hash_api_key(api_key: &str) -> String {
    let digest = hex::encode(Sha256::digest(api_key.as_bytes()));
    digest[..API_KEY_DIGEST_CHARS].to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
