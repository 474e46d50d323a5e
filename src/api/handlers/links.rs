//! Handlers for link management endpoints (inspect, toggle, delete, purge).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::dto::link::{CleanupResponse, LinkResponse, UpdateLinkRequest};
use crate::error::AppError;
use crate::state::AppState;

/// Returns a link's details and click count.
///
/// # Endpoint
///
/// `GET /api/links/{code}`
///
/// Inactive and expired links are reported too; deleted ones are not.
pub async fn get_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(&code).await?;
    let short_url = state.link_service.short_url(&link.code);

    Ok(Json(LinkResponse::from_link(link, short_url)))
}

/// Activates or deactivates a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{code}` with body `{"is_active": false}`
pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state
        .link_service
        .set_link_active(&code, payload.is_active)
        .await?;
    let short_url = state.link_service.short_url(&link.code);

    Ok(Json(LinkResponse::from_link(link, short_url)))
}

/// Soft-deletes a link.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
///
/// Returns `204 No Content`, or 404 if the link does not exist.
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Removes every expired link right away instead of waiting for the
/// background purge.
///
/// # Endpoint
///
/// `POST /api/cleanup`
pub async fn cleanup_handler(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, AppError> {
    let purged = state.link_service.purge_expired_links().await?;
    Ok(Json(CleanupResponse { purged }))
}
