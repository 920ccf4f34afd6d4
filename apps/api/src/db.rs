use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Creates a PostgreSQL connection pool. Connections are opened on first
/// use, so the service starts even while the database is down.
pub fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(database_url)
        .context("DATABASE_URL is not a valid PostgreSQL connection string")?;

    info!("PostgreSQL pool configured (lazy connect)");
    Ok(pool)
}

/// `true` when `SELECT 1` succeeds within the ping timeout.
pub async fn ping(pool: &PgPool) -> bool {
    match tokio::time::timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            warn!("Database ping failed: {e}");
            false
        }
        Err(_) => {
            warn!("Database ping timed out");
            false
        }
    }
}
