use std::time::Duration;

use anyhow::{Context, Result};
use commerce_etl::{
    api::HttpSource,
    bootstrap, config, db,
    pipeline::Pipeline,
    storage::LocalStorage,
    warehouse::{FileSink, PgWarehouse},
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    let config = config::load().context("Failed to load configuration")?;
    bootstrap::init_tracing(&config.log_level);

    let http_client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build the HTTP client")?;
    let source = HttpSource::new(http_client, &config.source);
    let storage = LocalStorage::new(&config.storage.data_dir);

    let report = match &config.database {
        Some(database) => {
            tracing::info!("Running migrations...");
            let migrations_count = db::run_migrations_blocking(&database.url)
                .await
                .context("Failed to prepare the warehouse")?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            let pool = db::create_pool(database)
                .await
                .context("Failed to connect to the warehouse")?;
            Pipeline::new(source, storage, PgWarehouse::new(pool))
                .run()
                .await?
        }
        None => {
            tracing::warn!(
                "DATABASE_URL is not set; loading tables into {}/warehouse",
                storage.root().display()
            );
            Pipeline::new(source, storage.clone(), FileSink::new(storage))
                .run()
                .await?
        }
    };

    tracing::info!(?report, "Run finished");
    Ok(())
}
