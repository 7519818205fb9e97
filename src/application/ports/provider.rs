use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chain::{ChainAccount, ChainApp, ChainBlock, ChainNode, ChainTransaction};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {route} failed: {source}")]
    Request {
        route: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{route} answered with status {status}")]
    UnexpectedStatus { route: &'static str, status: u16 },

    #[error("could not decode {route} response: {source}")]
    Decode {
        route: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// One page of a listing at a fixed height. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub height: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of pages, when the listing reports one.
    pub total_pages: Option<u32>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_pages: None,
        }
    }
}

/// Read access to the ledger.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn get_height(&self) -> ProviderResult<i64>;
    async fn get_block(&self, height: i64) -> ProviderResult<ChainBlock>;
    async fn get_block_transactions(
        &self,
        request: PageRequest,
    ) -> ProviderResult<Page<ChainTransaction>>;
    async fn get_accounts(&self, request: PageRequest) -> ProviderResult<Page<ChainAccount>>;
    async fn get_apps(&self, request: PageRequest) -> ProviderResult<Page<ChainApp>>;
    async fn get_nodes(&self, request: PageRequest) -> ProviderResult<Page<ChainNode>>;
}
