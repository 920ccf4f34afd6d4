use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;

/// Static pages: `/` is the login page, everything else lives under `/static`
/// (index, login, upload_cv, analyze, result).
pub fn page_routes(frontend_dir: &Path) -> Router<AppState> {
    Router::new()
        .route_service("/", ServeFile::new(frontend_dir.join("login.html")))
        .nest_service("/static", ServeDir::new(frontend_dir))
}
