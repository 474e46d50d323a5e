//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: The click queue is closed
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "cache": { "status": "ok", "message": "12/10000 entries" },
///     "rate_limiter": { "status": "ok", "message": "3 active windows" },
///     "click_queue": { "status": "ok", "message": "9998/10000 free, 0 dropped" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let cache_check = CheckStatus::ok(format!(
        "{}/{} entries",
        state.cache.len(),
        state.cache.max_entries()
    ));

    let limiter_check = CheckStatus::ok(format!(
        "{} active windows",
        state.rate_limiter.len()
    ));

    let queue_check = check_click_queue(&state);

    let all_healthy = cache_check.is_ok() && limiter_check.is_ok() && queue_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            cache: cache_check,
            rate_limiter: limiter_check,
            click_queue: queue_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks if the click tracking queue is operational.
fn check_click_queue(state: &AppState) -> CheckStatus {
    let clicks = &state.click_sender;

    if clicks.is_closed() {
        CheckStatus::error(format!("Click queue is closed, {} dropped", clicks.dropped()))
    } else {
        CheckStatus::ok(format!(
            "{}/{} free, {} dropped",
            clicks.capacity(),
            clicks.max_capacity(),
            clicks.dropped()
        ))
    }
}
