use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::recommendation::advisor::CareerAdvisor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable advisor. Default: LlmCareerAdvisor over the Gemini client.
    pub advisor: Arc<dyn CareerAdvisor>,
    /// Present only when DATABASE_URL is set. Used for readiness reporting.
    pub db: Option<PgPool>,
}
