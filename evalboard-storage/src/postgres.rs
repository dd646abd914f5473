use anyhow::{Context, Result};
use async_trait::async_trait;
use evalboard_core::{CoreError, HealthCheck};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::fmt;
use std::time::Duration;

/// Connection settings for the evalboard database.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolSettings {
    /// Small pool suited to tests and one-off tooling.
    pub fn for_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Opens a pool against `database_url` with [`PoolSettings::for_url`].
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_settings(&PoolSettings::for_url(database_url)).await
}

pub async fn create_pool_with_settings(settings: &PoolSettings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections.min(settings.max_connections))
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.database_url)
        .await
        .context("connecting to the evalboard database")?;

    tracing::info!(
        max = settings.max_connections,
        min = settings.min_connections,
        "Evalboard database pool created"
    );
    Ok(pool)
}

/// Applies the models/evals/results/judgments schema.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("running evalboard migrations")?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Connection usage, traced by each database health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    pub size: u32,
    pub idle: usize,
    pub active: usize,
}

impl PoolUsage {
    pub fn from_counts(size: u32, idle: usize) -> Self {
        Self {
            size,
            idle,
            active: (size as usize).saturating_sub(idle),
        }
    }

    pub fn of(pool: &PgPool) -> Self {
        Self::from_counts(pool.size(), pool.num_idle())
    }
}

impl fmt::Display for PoolUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} connections busy", self.active, self.size)
    }
}

/// [`HealthCheck`] backed by a `SELECT 1` round trip.
pub struct PostgresHealthCheck {
    pool: PgPool,
}

impl PostgresHealthCheck {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PostgresHealthCheck {
    async fn check(&self) -> evalboard_core::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::Database(e.to_string()))?;
        tracing::trace!(usage = %PoolUsage::of(&self.pool), "Database health check passed");
        Ok(())
    }
}
