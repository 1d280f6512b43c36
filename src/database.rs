// src/database.rs
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;
use crate::store::StoreError;

const SCHEMA: &str = include_str!("../migrations/0001_fashion_shop_data.sql");

/// Connects to PostgreSQL and makes sure the record table exists.
/// Any failure here means the store is unreachable.
pub async fn create_pool(config: &Config) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("schema bootstrap failed: {e}")))?;

    tracing::info!("Connected to database");
    Ok(pool)
}
