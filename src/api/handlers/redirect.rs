//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code through the cache, falling back to the repository
/// 2. Queue a click event for the background worker
/// 3. Return 307 Temporary Redirect
///
/// # Click Tracking
///
/// Click events go to a bounded channel. If the queue is full the click is
/// dropped and counted; the redirect never waits on it.
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown, deleted or inactive.
/// Returns 410 Gone if the link has expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.link_service.resolve(&code).await?;

    state.click_sender.record(ClickEvent::new(code));

    Ok(Redirect::temporary(&long_url))
}
