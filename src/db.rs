use anyhow::Context;
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::{app_error::AppResult, config::DatabaseConfig};

pub type DbPool = Pool<AsyncPgConnection>;

/// Creates the warehouse tables when they do not exist yet.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .await
        .context("Failed to build the database connection pool")?;
    Ok(pool)
}

/// Applies pending migrations on a blocking connection and returns how many ran.
pub async fn run_migrations_blocking(url: &str) -> AppResult<usize> {
    let url = url.to_string();
    let applied = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect to run migrations")?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!(err))
            .context("Failed to run migrations")?;
        Ok(versions.len())
    })
    .await
    .context("Migration task failed")??;

    Ok(applied)
}
