//! Route definitions.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};

use crate::handlers::{health, hook, upload};
use crate::middleware::logging::request_logging;
use crate::state::AppState;

/// Builds the router with all webhook routes.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/get_hook", post(hook::get_hook))
        .route("/upload_hook", post(upload::upload_hook))
        .route("/health", get(health::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}
