use thiserror::Error;

use crate::application::ports::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no transactions to index at height {height}")]
    NoTransactionsToIndex { height: i64 },

    #[error("no accounts to index at height {height}")]
    NoAccountsToIndex { height: i64 },

    #[error("no apps to index at height {height}")]
    NoAppsToIndex { height: i64 },

    #[error("no nodes to index at height {height}")]
    NoNodesToIndex { height: i64 },

    #[error("block to index at height {height} has no hash")]
    BlockHasNoHash { height: i64 },

    #[error("transaction {hash} has no fee entry")]
    TransactionWithoutFee { hash: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("no previous height stored")]
    NoPreviousHeight,

    #[error("failed to decode stored {column} payload: {source}")]
    PayloadDecode {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode payload: {0}")]
    PayloadEncode(#[source] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// True for the "valid response, nothing to persist" outcomes.
    pub fn is_nothing_to_index(&self) -> bool {
        matches!(
            self,
            AppError::NoTransactionsToIndex { .. }
                | AppError::NoAccountsToIndex { .. }
                | AppError::NoAppsToIndex { .. }
                | AppError::NoNodesToIndex { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
