//! Handler for link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{
    BatchSummary, ShortenRequest, ShortenResponse, ShortenResultItem, UrlItem,
};
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;

/// Creates shortened URLs for one or more long URLs.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Batch Processing
///
/// Processes URLs independently. If one fails, others continue processing.
/// Each result includes either success data or error information.
///
/// # Request Body
///
/// ```json
/// {
///   "urls": [
///     {
///       "url": "https://example.com",
///       "custom_code": "my-link",
///       "expire_in_hours": 24
///     }
///   ]
/// }
/// ```
///
/// # Response
///
/// `201 Created` when at least one URL succeeded, `200 OK` otherwise.
///
/// ```json
/// {
///   "summary": { "total": 1, "successful": 1, "failed": 0 },
///   "items": [
///     {
///       "long_url": "https://example.com",
///       "code": "my-link",
///       "short_url": "http://localhost:3000/my-link",
///       "expires_at": "2026-01-02T00:00:00Z"
///     }
///   ]
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the request body fails validation.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let total = payload.urls.len();
    let mut results = Vec::with_capacity(total);
    let mut successful = 0;
    let mut failed = 0;

    for item in payload.urls {
        let long_url = item.url.clone();

        match process_single_url(&state, item).await {
            Ok(link) => {
                successful += 1;
                results.push(ShortenResultItem::Success {
                    long_url,
                    short_url: state.link_service.short_url(&link.code),
                    code: link.code,
                    expires_at: link.expires_at,
                });
            }
            Err(err) => {
                failed += 1;
                results.push(ShortenResultItem::Error {
                    long_url,
                    error: err.to_error_info(),
                });
            }
        }
    }

    let status = if successful > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(ShortenResponse {
            summary: BatchSummary {
                total,
                successful,
                failed,
            },
            items: results,
        }),
    ))
}

async fn process_single_url(state: &AppState, item: UrlItem) -> Result<Link, AppError> {
    state
        .link_service
        .create_short_link(item.url, item.custom_code, item.expire_in_hours)
        .await
}
