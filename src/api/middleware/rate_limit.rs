//! Fixed-window rate limiting middleware.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::AppError;
use crate::infrastructure::rate_limit::RateDecision;
use crate::state::AppState;
use crate::utils::client_identity::rate_limit_key;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Admits or rejects a request against the shared [`RateLimiter`](crate::infrastructure::rate_limit::RateLimiter).
///
/// # Client Identity
///
/// - `apikey:<digest>` when an `X-API-Key` header is sent
/// - `ip:<addr>` otherwise, from the peer socket or, when
///   `behind_proxy` is set, from `X-Forwarded-For` / `X-Real-IP`
///
/// Paths listed in `rate_limit_excluded` bypass the limiter entirely.
///
/// # Response Headers
///
/// - `X-RateLimit-Limit` and `X-RateLimit-Remaining` on every limited response
/// - `Retry-After` (seconds) on `429 Too Many Requests`
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/shorten", post(shorten_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    if st.rate_limit_excluded.contains(req.uri().path()) {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let key = rate_limit_key(req.headers(), peer, st.behind_proxy);

    let decision = st.rate_limiter.allow(&key);

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        metrics::counter!("rate_limit_rejections_total").increment(1);
        warn!(key = %key, path = %req.uri().path(), "Rate limit exceeded");
        AppError::too_many_requests(decision.retry_after_secs()).into_response()
    };

    set_rate_limit_headers(&mut response, &decision);
    response
}

fn set_rate_limit_headers(response: &mut Response, decision: &RateDecision) {
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
}
