use chrono::{DateTime, Duration, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::domain::chain::{StdTx, TxResult};

/// Block snapshot. One row per height.
///
/// The quantity fields and `took` are filled in by a second pass once the
/// accounts, apps and nodes of the same height are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub hash: String,
    pub height: i64,
    pub time: DateTime<Utc>,
    pub proposer_address: String,
    pub tx_count: i64,
    pub tx_total: i64,
    pub accounts_quantity: i64,
    pub apps_quantity: i64,
    pub nodes_quantity: i64,
    pub took: Duration,
}

/// Aggregate fields written onto an already stored block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCalculatedFields {
    pub height: i64,
    pub accounts_quantity: i64,
    pub apps_quantity: i64,
    pub nodes_quantity: i64,
    pub took: Duration,
}

impl Block {
    pub fn with_calculated_fields(self, fields: &BlockCalculatedFields) -> Self {
        Self {
            accounts_quantity: fields.accounts_quantity,
            apps_quantity: fields.apps_quantity,
            nodes_quantity: fields.nodes_quantity,
            took: fields.took,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub from_address: String,
    pub to_address: String,
    pub app_pub_key: String,
    pub blockchains: Vec<String>,
    pub message_type: String,
    pub height: i64,
    pub index: i32,
    pub std_tx: StdTx,
    pub tx_result: TxResult,
    pub tx: String,
    pub entropy: i64,
    pub fee: i64,
    pub fee_denomination: String,
    pub amount: BigInt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub height: i64,
    pub balance: BigInt,
    pub balance_denomination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub address: String,
    pub height: i64,
    pub jailed: bool,
    pub public_key: String,
    pub staked_tokens: BigInt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub address: String,
    pub height: i64,
    pub jailed: bool,
    pub public_key: String,
    pub service_url: String,
    pub tokens: BigInt,
}

/// Sort direction for listings ordered by height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Page window of a listing. Pages are 1-based; values below 1 fall back
/// to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    page: i64,
    per_page: i64,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

impl Paging {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_PER_PAGE: i64 = 1000;

    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: if page < 1 { Self::DEFAULT_PAGE } else { page },
            per_page: if per_page < 1 {
                Self::DEFAULT_PER_PAGE
            } else {
                per_page
            },
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Rows skipped before the window starts. Saturates for pages far
    /// past any table.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// A fully normalized collection of one kind at one height, ready for a
/// single bulk write.
#[derive(Debug, Clone)]
pub enum SnapshotBatch {
    Transactions(Vec<Transaction>),
    Accounts(Vec<Account>),
    Apps(Vec<App>),
    Nodes(Vec<Node>),
}

impl SnapshotBatch {
    pub fn len(&self) -> usize {
        match self {
            SnapshotBatch::Transactions(txs) => txs.len(),
            SnapshotBatch::Accounts(accounts) => accounts.len(),
            SnapshotBatch::Apps(apps) => apps.len(),
            SnapshotBatch::Nodes(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Natural keys of the batch, in batch order.
    pub fn keys(&self) -> Vec<String> {
        match self {
            SnapshotBatch::Transactions(txs) => txs.iter().map(|t| t.hash.clone()).collect(),
            SnapshotBatch::Accounts(accounts) => {
                accounts.iter().map(|a| a.address.clone()).collect()
            }
            SnapshotBatch::Apps(apps) => apps.iter().map(|a| a.address.clone()).collect(),
            SnapshotBatch::Nodes(nodes) => nodes.iter().map(|n| n.address.clone()).collect(),
        }
    }
}
