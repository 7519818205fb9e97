//! PostgreSQL snapshot store.
//!
//! Collections are written with one `INSERT ... SELECT * FROM UNNEST(...)`
//! per batch, binding one array per column. Listings are read through a
//! server side cursor inside a short read transaction:
//! `DECLARE` over the ordered result, `MOVE ABSOLUTE` to the start of the
//! window, `FETCH` one page, commit.
//!
//! Reads that take an optional height use the highest height stored in the
//! table when none is given. That height is resolved by the query itself.

mod accounts;
mod apps;
mod blocks;
pub mod codec;
mod nodes;
mod transactions;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    FromRow, PgPool,
};

use crate::{
    application::{AppResult, SnapshotStore},
    domain::{Account, App, Block, BlockCalculatedFields, Node, Paging, Transaction},
};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> AppResult<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;

        tracing::info!("Database migrations completed successfully");
        Ok(())
    }

    /// Reads one window of `query` through the cursor `cursor`.
    async fn read_page<T>(&self, cursor: &str, query: &str, paging: Paging) -> AppResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut tx = self.pool.begin().await?;

        let declare = format!(
            "DECLARE {cursor} CURSOR FOR {query}; MOVE ABSOLUTE {offset} FROM {cursor};",
            offset = paging.offset(),
        );
        sqlx::raw_sql(&declare).execute(&mut *tx).await?;

        let fetch = format!("FETCH {} FROM {cursor}", paging.per_page());
        let rows = sqlx::query_as::<_, T>(&fetch)
            .persistent(false)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            cursor,
            page = paging.page(),
            per_page = paging.per_page(),
            count = rows.len(),
            "Read page"
        );
        Ok(rows)
    }
}

/// `WHERE` condition selecting `height`, or the highest height in `table`.
fn height_condition(table: &str, height: Option<i64>) -> String {
    match height {
        Some(height) => format!("height = {height}"),
        None => format!("height = (SELECT MAX(height) FROM {table})"),
    }
}

#[async_trait]
impl SnapshotStore for PostgresStore {
    async fn write_block(&self, block: &Block) -> AppResult<()> {
        PostgresStore::write_block(self, block).await
    }

    async fn write_transactions(&self, txs: &[Transaction]) -> AppResult<()> {
        PostgresStore::write_transactions(self, txs).await
    }

    async fn write_accounts(&self, accounts: &[Account]) -> AppResult<()> {
        PostgresStore::write_accounts(self, accounts).await
    }

    async fn write_apps(&self, apps: &[App]) -> AppResult<()> {
        PostgresStore::write_apps(self, apps).await
    }

    async fn write_nodes(&self, nodes: &[Node]) -> AppResult<()> {
        PostgresStore::write_nodes(self, nodes).await
    }

    async fn write_block_calculated_fields(
        &self,
        fields: &BlockCalculatedFields,
    ) -> AppResult<()> {
        PostgresStore::write_block_calculated_fields(self, fields).await
    }

    async fn read_block_by_height(&self, height: Option<i64>) -> AppResult<Block> {
        PostgresStore::read_block_by_height(self, height).await
    }

    async fn get_accounts_quantity(&self, height: Option<i64>) -> AppResult<i64> {
        PostgresStore::get_accounts_quantity(self, height).await
    }

    async fn get_apps_quantity(&self, height: Option<i64>) -> AppResult<i64> {
        PostgresStore::get_apps_quantity(self, height).await
    }

    async fn get_nodes_quantity(&self, height: Option<i64>) -> AppResult<i64> {
        PostgresStore::get_nodes_quantity(self, height).await
    }

    async fn get_max_height_in_blocks(&self) -> AppResult<i64> {
        PostgresStore::get_max_height_in_blocks(self).await
    }
}
