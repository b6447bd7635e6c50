//! Warehouse sinks. Every load replaces the whole target table atomically.

use anyhow::Context;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::{
    app_error::{AppError, AppResult},
    db::DbPool,
    models::{CartDetail, CartItem, CategorySummary, Product, TableSchema, User, UserSummary},
    schema::{cart_details, carts_table, category_summary, products_table, user_summary, users_table},
    storage::Storage,
    tabular,
};

/// Postgres allows 65535 bind parameters per statement; the widest table has
/// eleven columns.
const INSERT_CHUNK_ROWS: usize = 1000;

/// A finished table on its way to the sink.
#[derive(Debug, Clone, Copy)]
pub enum Dataset<'a> {
    Users(&'a [User]),
    Products(&'a [Product]),
    CartItems(&'a [CartItem]),
    UserSummary(&'a [UserSummary]),
    CategorySummary(&'a [CategorySummary]),
    CartDetails(&'a [CartDetail]),
}

impl Dataset<'_> {
    pub fn table_name(&self) -> &'static str {
        match self {
            Dataset::Users(_) => User::NAME,
            Dataset::Products(_) => Product::NAME,
            Dataset::CartItems(_) => CartItem::NAME,
            Dataset::UserSummary(_) => UserSummary::NAME,
            Dataset::CategorySummary(_) => CategorySummary::NAME,
            Dataset::CartDetails(_) => CartDetail::NAME,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Users(_) => User::COLUMNS,
            Dataset::Products(_) => Product::COLUMNS,
            Dataset::CartItems(_) => CartItem::COLUMNS,
            Dataset::UserSummary(_) => UserSummary::COLUMNS,
            Dataset::CategorySummary(_) => CategorySummary::COLUMNS,
            Dataset::CartDetails(_) => CartDetail::COLUMNS,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Users(rows) => rows.len(),
            Dataset::Products(rows) => rows.len(),
            Dataset::CartItems(rows) => rows.len(),
            Dataset::UserSummary(rows) => rows.len(),
            Dataset::CategorySummary(rows) => rows.len(),
            Dataset::CartDetails(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encode(&self) -> AppResult<Vec<u8>> {
        match *self {
            Dataset::Users(rows) => tabular::encode(rows),
            Dataset::Products(rows) => tabular::encode(rows),
            Dataset::CartItems(rows) => tabular::encode(rows),
            Dataset::UserSummary(rows) => tabular::encode(rows),
            Dataset::CategorySummary(rows) => tabular::encode(rows),
            Dataset::CartDetails(rows) => tabular::encode(rows),
        }
    }
}

/// Destination accepting a full table. Returns the number of rows written.
pub trait Sink {
    fn replace(&self, dataset: Dataset<'_>) -> impl Future<Output = AppResult<usize>> + Send;
}

/// Postgres warehouse. Each table is replaced inside one transaction, so
/// readers see either the previous or the new contents.
#[derive(Clone)]
pub struct PgWarehouse {
    pool: DbPool,
}

impl PgWarehouse {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

macro_rules! replace_table {
    ($conn:expr, $table:expr, $rows:expr) => {{
        diesel::delete($table).execute($conn).await?;
        let mut inserted = 0;
        for chunk in $rows.chunks(INSERT_CHUNK_ROWS) {
            inserted += diesel::insert_into($table)
                .values(chunk)
                .execute($conn)
                .await?;
        }
        Ok::<usize, AppError>(inserted)
    }};
}

impl Sink for PgWarehouse {
    async fn replace(&self, dataset: Dataset<'_>) -> AppResult<usize> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let inserted = conn
            .transaction(move |tx| {
                Box::pin(async move {
                    match dataset {
                        Dataset::Users(rows) => replace_table!(tx, users_table::table, rows),
                        Dataset::Products(rows) => replace_table!(tx, products_table::table, rows),
                        Dataset::CartItems(rows) => replace_table!(tx, carts_table::table, rows),
                        Dataset::UserSummary(rows) => replace_table!(tx, user_summary::table, rows),
                        Dataset::CategorySummary(rows) => {
                            replace_table!(tx, category_summary::table, rows)
                        }
                        Dataset::CartDetails(rows) => replace_table!(tx, cart_details::table, rows),
                    }
                })
            })
            .await?;

        debug!(table = dataset.table_name(), rows = inserted, "Replaced warehouse table");
        Ok(inserted)
    }
}

/// Writes each table as `warehouse/<table>.csv` through a [`Storage`], whose
/// atomic put gives the full-table replace.
#[derive(Debug, Clone)]
pub struct FileSink<S> {
    storage: S,
}

impl<S> FileSink<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn object_name(table: &str) -> String {
        format!("warehouse/{table}.csv")
    }
}

impl<S: Storage + Send + Sync> Sink for FileSink<S> {
    async fn replace(&self, dataset: Dataset<'_>) -> AppResult<usize> {
        let bytes = dataset.encode()?;
        self.storage
            .put(&Self::object_name(dataset.table_name()), &bytes)?;
        Ok(dataset.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[tokio::test]
    async fn file_sink_replaces_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let sink = FileSink::new(storage.clone());

        let first = [
            CategorySummary { category: "a".into(), total_sales: 2.0, total_items_sold: 1 },
            CategorySummary { category: "b".into(), total_sales: 1.0, total_items_sold: 1 },
        ];
        let second = [CategorySummary { category: "c".into(), total_sales: 5.5, total_items_sold: 3 }];

        assert_eq!(sink.replace(Dataset::CategorySummary(&first)).await.unwrap(), 2);
        assert_eq!(sink.replace(Dataset::CategorySummary(&second)).await.unwrap(), 1);

        let stored = storage.get("warehouse/category_summary.csv").unwrap().unwrap();
        assert_eq!(
            String::from_utf8(stored).unwrap(),
            "category,total_sales,total_items_sold\nc,5.5,3\n"
        );
    }

    #[test]
    fn dataset_reports_schema() {
        let rows: [CartDetail; 0] = [];
        let dataset = Dataset::CartDetails(&rows);

        assert_eq!(dataset.table_name(), "cart_details");
        assert_eq!(dataset.columns().len(), 11);
        assert!(dataset.is_empty());
    }
}
