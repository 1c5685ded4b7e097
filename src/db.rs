use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::users::{memory::MemoryUserStore, repo::PgUserStore, store::UserStore};

/// Picks the store adapter for `DATABASE_URL`: `memory://` keeps users in
/// process, anything else is treated as a PostgreSQL connection string.
pub async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    if config.database_url.starts_with("memory:") {
        tracing::warn!("using in-memory user store; data is lost on restart");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    tracing::info!(max_connections = config.db_max_connections, "database pool ready");
    Ok(Arc::new(PgUserStore::new(pool)))
}
