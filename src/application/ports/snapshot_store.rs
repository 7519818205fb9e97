use async_trait::async_trait;

use crate::application::AppResult;
use crate::domain::{Account, App, Block, BlockCalculatedFields, Node, SnapshotBatch, Transaction};

/// Persistence used while indexing.
///
/// Every write of a collection is a single statement, so a batch is either
/// stored whole or not at all.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn write_block(&self, block: &Block) -> AppResult<()>;
    async fn write_transactions(&self, txs: &[Transaction]) -> AppResult<()>;
    async fn write_accounts(&self, accounts: &[Account]) -> AppResult<()>;
    async fn write_apps(&self, apps: &[App]) -> AppResult<()>;
    async fn write_nodes(&self, nodes: &[Node]) -> AppResult<()>;

    /// Sets the aggregate fields of the block stored at `fields.height`.
    async fn write_block_calculated_fields(
        &self,
        fields: &BlockCalculatedFields,
    ) -> AppResult<()>;

    /// `None` reads the block at the highest stored height.
    async fn read_block_by_height(&self, height: Option<i64>) -> AppResult<Block>;

    async fn get_accounts_quantity(&self, height: Option<i64>) -> AppResult<i64>;
    async fn get_apps_quantity(&self, height: Option<i64>) -> AppResult<i64>;
    async fn get_nodes_quantity(&self, height: Option<i64>) -> AppResult<i64>;

    async fn get_max_height_in_blocks(&self) -> AppResult<i64>;

    async fn write_batch(&self, batch: &SnapshotBatch) -> AppResult<()> {
        match batch {
            SnapshotBatch::Transactions(txs) => self.write_transactions(txs).await,
            SnapshotBatch::Accounts(accounts) => self.write_accounts(accounts).await,
            SnapshotBatch::Apps(apps) => self.write_apps(apps).await,
            SnapshotBatch::Nodes(nodes) => self.write_nodes(nodes).await,
        }
    }
}
