//! Provider over the ledger's JSON RPC.
//!
//! Every query is a POST with a JSON body. Account, app and node listings
//! report `total_pages`; the block transaction listing only reports the
//! number of transactions in the returned page.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    application::{Page, PageRequest, Provider, ProviderError, ProviderResult},
    domain::chain::{ChainAccount, ChainApp, ChainBlock, ChainNode, ChainTransaction},
};

const HEIGHT_ROUTE: &str = "/v1/query/height";
const BLOCK_ROUTE: &str = "/v1/query/block";
const BLOCK_TXS_ROUTE: &str = "/v1/query/blocktxs";
const ACCOUNTS_ROUTE: &str = "/v1/query/accounts";
const APPS_ROUTE: &str = "/v1/query/apps";
const NODES_ROUTE: &str = "/v1/query/nodes";

pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct HeightBody {
    height: i64,
}

#[derive(Serialize)]
struct BlockTxsBody {
    height: i64,
    page: u32,
    per_page: u32,
    prove: bool,
    order: &'static str,
}

#[derive(Serialize)]
struct ListingBody {
    height: i64,
    opts: ListingOpts,
}

#[derive(Serialize)]
struct ListingOpts {
    page: u32,
    per_page: u32,
}

impl From<PageRequest> for ListingBody {
    fn from(request: PageRequest) -> Self {
        Self {
            height: request.height,
            opts: ListingOpts {
                page: request.page,
                per_page: request.per_page,
            },
        }
    }
}

#[derive(Deserialize)]
struct HeightResponse {
    height: i64,
}

#[derive(Deserialize)]
struct BlockTxsResponse {
    #[serde(default)]
    txs: Vec<ChainTransaction>,
}

#[derive(Deserialize)]
struct ListingResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
    #[serde(default)]
    total_pages: u32,
}

impl<T> From<ListingResponse<T>> for Page<T> {
    fn from(response: ListingResponse<T>) -> Self {
        Page {
            items: response.result,
            total_pages: Some(response.total_pages),
        }
    }
}

impl From<BlockTxsResponse> for Page<ChainTransaction> {
    fn from(response: BlockTxsResponse) -> Self {
        Page {
            items: response.txs,
            total_pages: None,
        }
    }
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request {
                route: "client",
                source: Box::new(e),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("Initializing ledger RPC provider: {}", base_url);

        Ok(Self { client, base_url })
    }

    async fn post<B, R>(&self, route: &'static str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, route))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                route,
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                route,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ProviderError::Request {
            route,
            source: Box::new(e),
        })?;

        serde_json::from_slice(&bytes).map_err(|source| ProviderError::Decode { route, source })
    }

    async fn listing<T: DeserializeOwned>(
        &self,
        route: &'static str,
        request: PageRequest,
    ) -> ProviderResult<Page<T>> {
        let response: ListingResponse<T> = self.post(route, &ListingBody::from(request)).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn get_height(&self) -> ProviderResult<i64> {
        let response: HeightResponse = self.post(HEIGHT_ROUTE, &serde_json::json!({})).await?;
        Ok(response.height)
    }

    async fn get_block(&self, height: i64) -> ProviderResult<ChainBlock> {
        self.post(BLOCK_ROUTE, &HeightBody { height }).await
    }

    async fn get_block_transactions(
        &self,
        request: PageRequest,
    ) -> ProviderResult<Page<ChainTransaction>> {
        let body = BlockTxsBody {
            height: request.height,
            page: request.page,
            per_page: request.per_page,
            prove: false,
            order: "asc",
        };
        let response: BlockTxsResponse = self.post(BLOCK_TXS_ROUTE, &body).await?;
        Ok(response.into())
    }

    async fn get_accounts(&self, request: PageRequest) -> ProviderResult<Page<ChainAccount>> {
        self.listing(ACCOUNTS_ROUTE, request).await
    }

    async fn get_apps(&self, request: PageRequest) -> ProviderResult<Page<ChainApp>> {
        self.listing(APPS_ROUTE, request).await
    }

    async fn get_nodes(&self, request: PageRequest) -> ProviderResult<Page<ChainNode>> {
        self.listing(NODES_ROUTE, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_response_reports_total_pages() {
        let raw = r#"{
            "page": 1,
            "result": [
                {"address": "00353abd21ef72725b295ba5a9a5eb6082548e21", "coins": [{"amount": "212121", "denom": "upokt"}], "public_key": null}
            ],
            "total_pages": 4
        }"#;

        let response: ListingResponse<ChainAccount> = serde_json::from_str(raw).unwrap();
        let page: Page<ChainAccount> = response.into();

        assert_eq!(page.total_pages, Some(4));
        assert_eq!(page.items[0].coins[0].amount, "212121");
    }

    #[test]
    fn node_listing_decodes_service_url() {
        let raw = r#"{
            "result": [{
                "address": "00353abd21ef72725b295ba5a9a5eb6082548e21",
                "chains": ["0001"],
                "jailed": true,
                "public_key": "pk",
                "service_url": "https://node.example:443",
                "status": 2,
                "tokens": "15000000000",
                "unstaking_time": "0001-01-01T00:00:00Z"
            }],
            "total_pages": 1
        }"#;

        let response: ListingResponse<ChainNode> = serde_json::from_str(raw).unwrap();

        assert!(response.result[0].jailed);
        assert_eq!(response.result[0].service_url, "https://node.example:443");
        assert_eq!(response.result[0].tokens, "15000000000");
    }

    #[test]
    fn empty_block_transactions_page() {
        let response: BlockTxsResponse =
            serde_json::from_str(r#"{"txs": [], "page_count": 0, "total_count": 0}"#).unwrap();
        let page: Page<ChainTransaction> = response.into();

        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn listing_body_nests_paging_options() {
        let body = ListingBody::from(PageRequest {
            height: 21,
            page: 2,
            per_page: 7,
        });

        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"height": 21, "opts": {"page": 2, "per_page": 7}})
        );
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let provider = HttpProvider::new("http://localhost:8081/", Duration::from_secs(1)).unwrap();

        assert_eq!(provider.base_url, "http://localhost:8081");
    }
}
