//! API route configuration.

use crate::api::handlers::{
    cleanup_handler, delete_link_handler, get_link_handler, shorten_handler,
    update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Link management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /shorten`        - Create shortened URLs (batch-capable)
/// - `GET    /links/{code}`   - Link details and click count
/// - `PATCH  /links/{code}`   - Activate or deactivate a link
/// - `DELETE /links/{code}`   - Soft-delete a link
/// - `POST   /cleanup`        - Remove expired links now
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route(
            "/links/{code}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/cleanup", post(cleanup_handler))
}
