pub mod health;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::recommendation::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and the small text fields next to the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let pages = pages::page_routes(&state.config.frontend_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analyze", post(handlers::handle_analyze_upload))
        .route("/api/v1/cv/analyze", post(handlers::handle_analyze_text))
        .route("/api/v1/cv/questions", post(handlers::handle_questions))
        .route(
            "/api/v1/recommendations",
            post(handlers::handle_recommendations),
        )
        .merge(pages)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
