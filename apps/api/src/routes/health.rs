use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::db;
use crate::llm_client;
use crate::state::AppState;

/// GET /health
/// Returns service status, version, and whether the optional database answers.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let database = match &state.db {
        None => "not_configured",
        Some(pool) => {
            if db::ping(pool).await {
                "ok"
            } else {
                "unavailable"
            }
        }
    };
    let status = if database == "unavailable" {
        "degraded"
    } else {
        "ok"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobiq-api",
        "model": llm_client::MODEL,
        "database": database
    }))
}
