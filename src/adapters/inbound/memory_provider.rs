use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    application::{Page, PageRequest, Provider, ProviderError, ProviderResult},
    domain::chain::{ChainAccount, ChainApp, ChainBlock, ChainNode, ChainTransaction},
};

/// Provider serving pre-loaded ledger state.
///
/// Account, app and node pages report their total page count; transaction
/// pages do not, like the block transaction listing of the RPC.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    blocks: HashMap<i64, ChainBlock>,
    transactions: HashMap<i64, Vec<ChainTransaction>>,
    accounts: HashMap<i64, Vec<ChainAccount>>,
    apps: HashMap<i64, Vec<ChainApp>>,
    nodes: HashMap<i64, Vec<ChainNode>>,
    failing_page: Option<u32>,
}

impl InMemoryProvider {
    pub fn with_block(mut self, height: i64, block: ChainBlock) -> Self {
        self.blocks.insert(height, block);
        self
    }

    pub fn with_transactions(mut self, height: i64, txs: Vec<ChainTransaction>) -> Self {
        self.transactions.insert(height, txs);
        self
    }

    pub fn with_accounts(mut self, height: i64, accounts: Vec<ChainAccount>) -> Self {
        self.accounts.insert(height, accounts);
        self
    }

    pub fn with_apps(mut self, height: i64, apps: Vec<ChainApp>) -> Self {
        self.apps.insert(height, apps);
        self
    }

    pub fn with_nodes(mut self, height: i64, nodes: Vec<ChainNode>) -> Self {
        self.nodes.insert(height, nodes);
        self
    }

    /// Every listing request for `page` fails with a 500 status.
    pub fn failing_on_page(mut self, page: u32) -> Self {
        self.failing_page = Some(page);
        self
    }

    fn page_of<T: Clone>(
        &self,
        route: &'static str,
        listing: &HashMap<i64, Vec<T>>,
        request: PageRequest,
        report_total: bool,
    ) -> ProviderResult<Page<T>> {
        if self.failing_page == Some(request.page) {
            return Err(ProviderError::UnexpectedStatus { route, status: 500 });
        }

        let Some(items) = listing.get(&request.height) else {
            return Ok(Page::empty());
        };

        let per_page = request.per_page.max(1) as usize;
        let start = (request.page.max(1) as usize - 1) * per_page;
        let total_pages = items.len().div_ceil(per_page) as u32;

        Ok(Page {
            items: items.iter().skip(start).take(per_page).cloned().collect(),
            total_pages: report_total.then_some(total_pages),
        })
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    async fn get_height(&self) -> ProviderResult<i64> {
        Ok(self.blocks.keys().copied().max().unwrap_or_default())
    }

    /// Unknown heights answer with a block that has no hash.
    async fn get_block(&self, height: i64) -> ProviderResult<ChainBlock> {
        Ok(self.blocks.get(&height).cloned().unwrap_or_default())
    }

    async fn get_block_transactions(
        &self,
        request: PageRequest,
    ) -> ProviderResult<Page<ChainTransaction>> {
        self.page_of("blocktxs", &self.transactions, request, false)
    }

    async fn get_accounts(&self, request: PageRequest) -> ProviderResult<Page<ChainAccount>> {
        self.page_of("accounts", &self.accounts, request, true)
    }

    async fn get_apps(&self, request: PageRequest) -> ProviderResult<Page<ChainApp>> {
        self.page_of("apps", &self.apps, request, true)
    }

    async fn get_nodes(&self, request: PageRequest) -> ProviderResult<Page<ChainNode>> {
        self.page_of("nodes", &self.nodes, request, true)
    }
}
