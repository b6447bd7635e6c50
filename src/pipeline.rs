//! Orchestrates one ETL run: extract, transform, load, then aggregate.
//!
//! Stages run strictly in order and each consumes the complete output of the
//! previous one. The first failing stage ends the run.

use std::fmt;

use chrono::{DateTime, Local};
use serde_json::Value;
use thiserror::Error;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::{
    aggregate::{self, FlatTables, Summaries},
    api::{EntityKind, Source},
    app_error::{AppError, AppResult},
    models::TableSchema,
    storage::{self, PROCESSED_CARTS, PROCESSED_PRODUCTS, PROCESSED_USERS, Storage},
    tabular,
    transform::{flatten_carts, normalize_products, normalize_users},
    warehouse::{Dataset, Sink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
            Stage::Aggregate => "aggregate",
        })
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: AppError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageFailure>;
}

impl<T> AtStage<T> for AppResult<T> {
    fn at(self, stage: Stage) -> Result<T, StageFailure> {
        self.map_err(|source| StageFailure { stage, source })
    }
}

/// Row counts of everything a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub users: usize,
    pub products: usize,
    pub cart_items: usize,
    pub user_summary: usize,
    pub category_summary: usize,
    pub cart_details: usize,
}

/// Storage names of the raw documents written by the extract stage.
#[derive(Debug, Clone)]
struct RawDocuments {
    users: String,
    products: String,
    carts: String,
}

pub struct Pipeline<Src, St, Sk> {
    source: Src,
    storage: St,
    sink: Sk,
}

impl<Src, St, Sk> Pipeline<Src, St, Sk>
where
    Src: Source,
    St: Storage,
    Sk: Sink,
{
    pub fn new(source: Src, storage: St, sink: Sk) -> Self {
        Self {
            source,
            storage,
            sink,
        }
    }

    pub async fn run(&self) -> Result<RunReport, StageFailure> {
        let span = info_span!("pipeline", run_id = %Uuid::new_v4());
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> Result<RunReport, StageFailure> {
        info!("Starting ETL pipeline");

        info!("Step 1: Extracting data from source");
        let raw = self.extract().await.at(Stage::Extract)?;

        info!("Step 2: Cleaning and transforming data");
        let tables = self.transform(&raw).at(Stage::Transform)?;

        info!("Step 3: Loading flat tables into the warehouse");
        self.load(&tables).await.at(Stage::Load)?;

        info!("Step 4: Running aggregations");
        let summaries = self.aggregate().await.at(Stage::Aggregate)?;

        info!("ETL pipeline completed successfully");
        Ok(RunReport {
            users: tables.users.len(),
            products: tables.products.len(),
            cart_items: tables.cart_items.len(),
            user_summary: summaries.user_summary.len(),
            category_summary: summaries.category_summary.len(),
            cart_details: summaries.cart_details.len(),
        })
    }

    async fn extract(&self) -> AppResult<RawDocuments> {
        let fetched_at = Local::now();
        Ok(RawDocuments {
            users: self.extract_one(EntityKind::Users, fetched_at).await?,
            products: self.extract_one(EntityKind::Products, fetched_at).await?,
            carts: self.extract_one(EntityKind::Carts, fetched_at).await?,
        })
    }

    async fn extract_one(&self, kind: EntityKind, fetched_at: DateTime<Local>) -> AppResult<String> {
        let document = self.source.fetch(kind).await?;
        let name = storage::raw_name(kind, fetched_at);
        self.storage.put(&name, &serde_json::to_vec(&document)?)?;
        info!(%kind, object = %name, "Raw data saved");
        Ok(name)
    }

    fn transform(&self, raw: &RawDocuments) -> AppResult<FlatTables> {
        let tables = FlatTables {
            users: normalize_users(&self.read_raw(&raw.users)?)?,
            products: normalize_products(&self.read_raw(&raw.products)?)?,
            cart_items: flatten_carts(&self.read_raw(&raw.carts)?)?,
        };

        self.write_processed(PROCESSED_USERS, &tables.users)?;
        self.write_processed(PROCESSED_PRODUCTS, &tables.products)?;
        self.write_processed(PROCESSED_CARTS, &tables.cart_items)?;
        Ok(tables)
    }

    async fn load(&self, tables: &FlatTables) -> AppResult<()> {
        self.replace(Dataset::Users(&tables.users)).await?;
        self.replace(Dataset::Products(&tables.products)).await?;
        self.replace(Dataset::CartItems(&tables.cart_items)).await?;
        Ok(())
    }

    async fn aggregate(&self) -> AppResult<Summaries> {
        let tables = FlatTables::load(&self.storage)?;
        let summaries = aggregate::aggregate(&tables);

        self.replace(Dataset::UserSummary(&summaries.user_summary)).await?;
        self.replace(Dataset::CategorySummary(&summaries.category_summary))
            .await?;
        self.replace(Dataset::CartDetails(&summaries.cart_details)).await?;
        Ok(summaries)
    }

    fn read_raw(&self, name: &str) -> AppResult<Value> {
        let bytes = self.storage.get(name)?.ok_or_else(|| AppError::Storage {
            name: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "raw document vanished"),
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_processed<T>(&self, name: &str, rows: &[T]) -> AppResult<()>
    where
        T: TableSchema + serde::Serialize,
    {
        self.storage.put(name, &tabular::encode(rows)?)?;
        info!(table = T::NAME, rows = rows.len(), object = name, "Processed data saved");
        Ok(())
    }

    async fn replace(&self, dataset: Dataset<'_>) -> AppResult<usize> {
        let rows = self.sink.replace(dataset).await?;
        info!(
            table = dataset.table_name(),
            columns = ?dataset.columns(),
            rows,
            "Loaded table"
        );
        Ok(rows)
    }
}
