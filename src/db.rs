use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::{config::AppConfig, state::AppState, users::services::ensure_first_superuser};

/// Builds the shared pool. Each repository call checks a connection out and
/// hands it back when the query future completes or is dropped.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Seeds the first superuser from config.
pub async fn init_db(state: &AppState) -> anyhow::Result<()> {
    ensure_first_superuser(state.users.as_ref(), &state.config.first_superuser).await
}
