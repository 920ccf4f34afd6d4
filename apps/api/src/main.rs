mod config;
mod db;
mod errors;
mod intake;
mod llm_client;
mod models;
mod recommendation;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::recommendation::advisor::{CareerAdvisor, LlmCareerAdvisor};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on a missing API key or an invalid limit
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobIQ API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL is optional; the pool connects on first use
    let db = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url)?;
            info!("Database pool configured");
            Some(pool)
        }
        None => {
            warn!("DATABASE_URL not set, /health will report the database as not_configured");
            None
        }
    };

    let llm = LlmClient::new(config.gemini_api_key.clone(), config.llm_timeout)?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout.as_secs()
    );
    let advisor: Arc<dyn CareerAdvisor> = Arc::new(LlmCareerAdvisor::new(llm));

    info!(
        "Serving pages from {} (upload limit {} bytes)",
        config.frontend_dir.display(),
        config.max_upload_bytes
    );

    let state = AppState {
        config: config.clone(),
        advisor,
        db,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
