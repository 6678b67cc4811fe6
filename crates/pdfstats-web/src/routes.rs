use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::state::AppState;

/// Headroom for multipart framing and any extra form fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit =
        DefaultBodyLimit::max(state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/analyze", post(handlers::analyze::analyze))
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
