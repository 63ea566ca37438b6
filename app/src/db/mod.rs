// app/src/db/mod.rs

pub mod seed;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::Result;

/// Connects the pool and, when configured, applies pending migrations.
pub async fn connect(config: &AppConfig) -> Result<PgPool> {
  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .acquire_timeout(Duration::from_secs(5))
    .connect(&config.database_url)
    .await?;
  info!(max_connections = config.db_max_connections, "Successfully connected to the database.");

  if config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .map_err(|e| crate::errors::AppError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations applied.");
  }
  Ok(pool)
}
