use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

use super::PostgresStore;
use crate::{
    application::{AppError, AppResult},
    domain::{Block, BlockCalculatedFields, Order, Paging},
};

const INSERT_BLOCK: &str = r#"
    INSERT INTO blocks (
        hash, height, time, proposer_address, tx_count, tx_total,
        accounts_quantity, apps_quantity, nodes_quantity, took
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (height) DO NOTHING"#;

const UPDATE_CALCULATED_FIELDS: &str = r#"
    UPDATE blocks
    SET accounts_quantity = $2, apps_quantity = $3, nodes_quantity = $4, took = $5
    WHERE height = $1"#;

const BLOCK_COLUMNS: &str = "hash, height, time, proposer_address, tx_count, tx_total, \
     accounts_quantity, apps_quantity, nodes_quantity, took";

#[derive(Debug, FromRow)]
struct DbBlock {
    hash: String,
    height: i64,
    time: DateTime<Utc>,
    proposer_address: String,
    tx_count: i64,
    tx_total: i64,
    accounts_quantity: i64,
    apps_quantity: i64,
    nodes_quantity: i64,
    /// Milliseconds.
    took: i64,
}

impl From<DbBlock> for Block {
    fn from(row: DbBlock) -> Self {
        Block {
            hash: row.hash,
            height: row.height,
            time: row.time,
            proposer_address: row.proposer_address,
            tx_count: row.tx_count,
            tx_total: row.tx_total,
            accounts_quantity: row.accounts_quantity,
            apps_quantity: row.apps_quantity,
            nodes_quantity: row.nodes_quantity,
            took: Duration::milliseconds(row.took),
        }
    }
}

impl PostgresStore {
    pub async fn write_block(&self, block: &Block) -> AppResult<()> {
        sqlx::query(INSERT_BLOCK)
            .bind(&block.hash)
            .bind(block.height)
            .bind(block.time)
            .bind(&block.proposer_address)
            .bind(block.tx_count)
            .bind(block.tx_total)
            .bind(block.accounts_quantity)
            .bind(block.apps_quantity)
            .bind(block.nodes_quantity)
            .bind(block.took.num_milliseconds())
            .execute(&self.pool)
            .await?;

        tracing::debug!(height = block.height, hash = %block.hash, "Saved block");
        Ok(())
    }

    /// Updates the aggregate fields of the block stored at `fields.height`.
    pub async fn write_block_calculated_fields(
        &self,
        fields: &BlockCalculatedFields,
    ) -> AppResult<()> {
        let result = sqlx::query(UPDATE_CALCULATED_FIELDS)
            .bind(fields.height)
            .bind(fields.accounts_quantity)
            .bind(fields.apps_quantity)
            .bind(fields.nodes_quantity)
            .bind(fields.took.num_milliseconds())
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            height = fields.height,
            rows = result.rows_affected(),
            "Updated block calculated fields"
        );
        Ok(())
    }

    pub async fn read_blocks(&self, order: Order, paging: Paging) -> AppResult<Vec<Block>> {
        let query = format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks ORDER BY height {}",
            order.as_sql()
        );

        let rows: Vec<DbBlock> = self.read_page("blocks_cursor", &query, paging).await?;
        Ok(rows.into_iter().map(Block::from).collect())
    }

    pub async fn read_block_by_hash(&self, hash: &str) -> AppResult<Block> {
        let query = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE hash = $1 LIMIT 1");

        let row: DbBlock = sqlx::query_as(&query)
            .bind(hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    /// Block at `height`, or the highest stored block when `None`.
    pub async fn read_block_by_height(&self, height: Option<i64>) -> AppResult<Block> {
        let query = format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks \
             WHERE height = COALESCE($1, (SELECT MAX(height) FROM blocks))"
        );

        let row: DbBlock = sqlx::query_as(&query)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    pub async fn get_blocks_quantity(&self) -> AppResult<i64> {
        let quantity = sqlx::query_scalar("SELECT COUNT(*) FROM blocks")
            .fetch_one(&self.pool)
            .await?;

        Ok(quantity)
    }

    pub async fn get_max_height_in_blocks(&self) -> AppResult<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(height) FROM blocks")
            .fetch_one(&self.pool)
            .await?;

        max.ok_or(AppError::NoPreviousHeight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn took_is_read_back_from_milliseconds() {
        let block = Block::from(DbBlock {
            hash: "ABCD".to_string(),
            height: 2,
            time: DateTime::<Utc>::UNIX_EPOCH,
            proposer_address: "proposer".to_string(),
            tx_count: 3,
            tx_total: 10,
            accounts_quantity: 5,
            apps_quantity: 1,
            nodes_quantity: 2,
            took: 900_000,
        });

        assert_eq!(block.took, Duration::minutes(15));
        assert_eq!(block.accounts_quantity, 5);
    }
}
