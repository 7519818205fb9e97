use std::sync::Arc;

use chrono::Duration;

use crate::{
    application::{
        use_cases::paginate::{PaginatingFetcher, ResourceKind},
        AppError, AppResult, Provider, SnapshotStore,
    },
    domain::{
        normalize::{
            normalize_account, normalize_app, normalize_block, normalize_node,
            normalize_transaction,
        },
        Block, BlockCalculatedFields, SnapshotBatch,
    },
};

/// Outcome of indexing every kind at one height. Kinds with nothing to
/// index count zero.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightReport {
    pub height: i64,
    pub block_hash: String,
    pub transactions: usize,
    pub accounts: usize,
    pub apps: usize,
    pub nodes: usize,
    pub calculated: BlockCalculatedFields,
}

/// Fetches ledger state for a height, normalizes it and stores it.
pub struct Indexer {
    provider: Arc<dyn Provider>,
    store: Arc<dyn SnapshotStore>,
    fetcher: PaginatingFetcher,
}

impl Indexer {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn SnapshotStore>) -> Self {
        Self::with_fetcher(provider, store, PaginatingFetcher::default())
    }

    pub fn with_fetcher(
        provider: Arc<dyn Provider>,
        store: Arc<dyn SnapshotStore>,
        fetcher: PaginatingFetcher,
    ) -> Self {
        Self {
            provider,
            store,
            fetcher,
        }
    }

    /// Indexes the block at `height` and returns its hash.
    pub async fn index_block(&self, height: i64) -> AppResult<String> {
        let block = self.fetch_block(height).await?;

        self.store.write_block(&block).await?;

        tracing::info!(height, hash = %block.hash, "Indexed block");
        Ok(block.hash)
    }

    /// Returns the hashes of the indexed transactions.
    pub async fn index_block_transactions(&self, height: i64) -> AppResult<Vec<String>> {
        let kind = ResourceKind::Transactions;
        let provider = &self.provider;
        let chain_txs = self
            .fetcher
            .fetch_all(kind, height, |request| {
                provider.get_block_transactions(request)
            })
            .await?;

        if chain_txs.is_empty() {
            return Err(kind.nothing_to_index(height));
        }

        let txs = chain_txs
            .iter()
            .map(normalize_transaction)
            .collect::<AppResult<Vec<_>>>()?;

        self.persist(kind, height, SnapshotBatch::Transactions(txs))
            .await
    }

    /// Returns the addresses of the indexed accounts.
    pub async fn index_accounts(&self, height: i64) -> AppResult<Vec<String>> {
        let kind = ResourceKind::Accounts;
        let provider = &self.provider;
        let chain_accounts = self
            .fetcher
            .fetch_all(kind, height, |request| provider.get_accounts(request))
            .await?;

        if chain_accounts.is_empty() {
            return Err(kind.nothing_to_index(height));
        }

        let accounts = chain_accounts
            .iter()
            .map(|account| normalize_account(height, account))
            .collect();

        self.persist(kind, height, SnapshotBatch::Accounts(accounts))
            .await
    }

    /// Returns the addresses of the indexed apps.
    pub async fn index_apps(&self, height: i64) -> AppResult<Vec<String>> {
        let kind = ResourceKind::Apps;
        let provider = &self.provider;
        let chain_apps = self
            .fetcher
            .fetch_all(kind, height, |request| provider.get_apps(request))
            .await?;

        if chain_apps.is_empty() {
            return Err(kind.nothing_to_index(height));
        }

        let apps = chain_apps
            .iter()
            .map(|app| normalize_app(height, app))
            .collect();

        self.persist(kind, height, SnapshotBatch::Apps(apps)).await
    }

    /// Returns the addresses of the indexed nodes.
    pub async fn index_nodes(&self, height: i64) -> AppResult<Vec<String>> {
        let kind = ResourceKind::Nodes;
        let provider = &self.provider;
        let chain_nodes = self
            .fetcher
            .fetch_all(kind, height, |request| provider.get_nodes(request))
            .await?;

        if chain_nodes.is_empty() {
            return Err(kind.nothing_to_index(height));
        }

        let nodes = chain_nodes
            .iter()
            .map(|node| normalize_node(height, node))
            .collect();

        self.persist(kind, height, SnapshotBatch::Nodes(nodes))
            .await
    }

    /// Fills the aggregate fields of the stored block at `height`. Must run
    /// after accounts, apps and nodes of that height are stored.
    pub async fn index_block_calculated_fields(
        &self,
        height: i64,
        with_took: bool,
    ) -> AppResult<BlockCalculatedFields> {
        let took = if with_took {
            let current = self.store.read_block_by_height(Some(height)).await?;
            self.took(&current).await?
        } else {
            Duration::zero()
        };

        let fields = self.calculated_fields(height, took).await?;
        self.store.write_block_calculated_fields(&fields).await?;

        tracing::info!(
            height,
            accounts = fields.accounts_quantity,
            apps = fields.apps_quantity,
            nodes = fields.nodes_quantity,
            took_ms = took.num_milliseconds(),
            "Indexed block calculated fields"
        );
        Ok(fields)
    }

    /// Indexes every listing at `height`, then writes the block together with
    /// its calculated fields.
    ///
    /// The block row is written last, so a stored block means its height was
    /// fully indexed. A height that failed midway has no block row and is
    /// indexed again on the next run; listing writes skip rows already stored.
    pub async fn index_height(&self, height: i64) -> AppResult<HeightReport> {
        let block = self.fetch_block(height).await?;
        let transactions = tolerate_empty(self.index_block_transactions(height).await)?;
        let accounts = tolerate_empty(self.index_accounts(height).await)?;
        let apps = tolerate_empty(self.index_apps(height).await)?;
        let nodes = tolerate_empty(self.index_nodes(height).await)?;

        let took = match self.took(&block).await {
            Err(AppError::Database(sqlx::Error::RowNotFound)) => {
                tracing::warn!(height, "Previous block not stored, took set to zero");
                Duration::zero()
            }
            took => took?,
        };
        let calculated = self.calculated_fields(height, took).await?;
        let block = block.with_calculated_fields(&calculated);

        self.store.write_block(&block).await?;

        tracing::info!(height, hash = %block.hash, "Indexed block");
        Ok(HeightReport {
            height,
            block_hash: block.hash,
            transactions,
            accounts,
            apps,
            nodes,
            calculated,
        })
    }

    async fn fetch_block(&self, height: i64) -> AppResult<Block> {
        let chain_block = self.provider.get_block(height).await?;
        normalize_block(height, &chain_block)
    }

    async fn calculated_fields(
        &self,
        height: i64,
        took: Duration,
    ) -> AppResult<BlockCalculatedFields> {
        Ok(BlockCalculatedFields {
            height,
            accounts_quantity: self.store.get_accounts_quantity(Some(height)).await?,
            apps_quantity: self.store.get_apps_quantity(Some(height)).await?,
            nodes_quantity: self.store.get_nodes_quantity(Some(height)).await?,
            took,
        })
    }

    async fn persist(
        &self,
        kind: ResourceKind,
        height: i64,
        batch: SnapshotBatch,
    ) -> AppResult<Vec<String>> {
        let keys = batch.keys();

        self.store.write_batch(&batch).await?;

        tracing::info!(
            height,
            kind = kind.as_str(),
            count = keys.len(),
            "Indexed snapshot"
        );
        Ok(keys)
    }

    /// Time between `current` and the block stored before it. Height 1 has
    /// no predecessor.
    async fn took(&self, current: &Block) -> AppResult<Duration> {
        if current.height == 1 {
            return Ok(Duration::zero());
        }

        let height = current.height - 1;
        let previous = self.store.read_block_by_height(Some(height)).await?;

        Ok(current.time.signed_duration_since(previous.time))
    }
}

fn tolerate_empty(result: AppResult<Vec<String>>) -> AppResult<usize> {
    match result {
        Ok(keys) => Ok(keys.len()),
        Err(err) if err.is_nothing_to_index() => {
            tracing::warn!("{err}");
            Ok(0)
        }
        Err(err) => Err(err),
    }
}
