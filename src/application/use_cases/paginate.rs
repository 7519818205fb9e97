use std::future::Future;

use crate::application::{AppError, AppResult, Page, PageRequest, ProviderResult};

/// How a listing signals its last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTermination {
    /// The first page reports how many pages exist.
    TotalPages,
    /// Pages are requested until one comes back empty.
    EmptyPage,
}

/// Paginated listings of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Transactions,
    Accounts,
    Apps,
    Nodes,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Transactions => "transactions",
            ResourceKind::Accounts => "accounts",
            ResourceKind::Apps => "apps",
            ResourceKind::Nodes => "nodes",
        }
    }

    /// Block transaction listings only report the size of each page.
    pub fn termination(&self) -> PageTermination {
        match self {
            ResourceKind::Transactions => PageTermination::EmptyPage,
            ResourceKind::Accounts | ResourceKind::Apps | ResourceKind::Nodes => {
                PageTermination::TotalPages
            }
        }
    }

    pub fn nothing_to_index(&self, height: i64) -> AppError {
        match self {
            ResourceKind::Transactions => AppError::NoTransactionsToIndex { height },
            ResourceKind::Accounts => AppError::NoAccountsToIndex { height },
            ResourceKind::Apps => AppError::NoAppsToIndex { height },
            ResourceKind::Nodes => AppError::NoNodesToIndex { height },
        }
    }
}

/// Collects every page of one listing at one height.
#[derive(Debug, Clone, Copy)]
pub struct PaginatingFetcher {
    per_page: u32,
}

impl Default for PaginatingFetcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PER_PAGE)
    }
}

impl PaginatingFetcher {
    pub const DEFAULT_PER_PAGE: u32 = 10_000;

    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Requests pages through `fetch_page` until the listing of `kind` is
    /// exhausted and returns all records in page order.
    ///
    /// The first failing page aborts the whole fetch and its error is
    /// returned as is; nothing is retried.
    pub async fn fetch_all<T, F, Fut>(
        &self,
        kind: ResourceKind,
        height: i64,
        mut fetch_page: F,
    ) -> AppResult<Vec<T>>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = ProviderResult<Page<T>>>,
    {
        let termination = kind.termination();
        let mut records = Vec::new();
        let mut total_pages = 1;
        let mut page = 1;

        loop {
            let request = PageRequest {
                height,
                page,
                per_page: self.per_page,
            };
            let fetched = fetch_page(request).await?;

            tracing::debug!(
                kind = kind.as_str(),
                height,
                page,
                count = fetched.items.len(),
                "Fetched page"
            );

            if fetched.items.is_empty() {
                break;
            }

            if page == 1 {
                if let Some(total) = fetched.total_pages {
                    total_pages = total;
                }
            }

            records.extend(fetched.items);

            if termination == PageTermination::TotalPages && page >= total_pages {
                break;
            }

            page += 1;
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn pages_of(
        items: Vec<u32>,
        per_page: u32,
        report_total: bool,
    ) -> impl Fn(PageRequest) -> Page<u32> {
        move |request| {
            let per_page = per_page as usize;
            let start = (request.page as usize - 1) * per_page;
            let page_items = items.iter().skip(start).take(per_page).copied().collect();
            let total = (items.len() + per_page - 1) / per_page;
            Page {
                items: page_items,
                total_pages: report_total.then_some(total as u32),
            }
        }
    }

    #[tokio::test]
    async fn total_pages_listing_stops_at_declared_total() {
        let calls = AtomicU32::new(0);
        let serve = pages_of((1..=25).collect(), 10, true);
        let fetcher = PaginatingFetcher::new(10);

        let records = fetcher
            .fetch_all(ResourceKind::Accounts, 21, |request| {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(request.height, 21);
                let page = serve(request);
                async move { Ok(page) }
            })
            .await
            .unwrap();

        assert_eq!(records, (1..=25).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_page_listing_requests_one_page_past_the_end() {
        let calls = AtomicU32::new(0);
        let serve = pages_of((1..=25).collect(), 10, false);
        let fetcher = PaginatingFetcher::new(10);

        let records = fetcher
            .fetch_all(ResourceKind::Transactions, 21, |request| {
                calls.fetch_add(1, Ordering::SeqCst);
                let page = serve(request);
                async move { Ok(page) }
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 25);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn listing_without_total_is_a_single_page() {
        let serve = pages_of((1..=25).collect(), 10, false);
        let fetcher = PaginatingFetcher::new(10);

        let records = fetcher
            .fetch_all(ResourceKind::Nodes, 21, |request| {
                let page = serve(request);
                async move { Ok(page) }
            })
            .await
            .unwrap();

        assert_eq!(records, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn failing_page_discards_collected_records() {
        let serve = pages_of((1..=25).collect(), 10, true);
        let fetcher = PaginatingFetcher::new(10);

        let err = fetcher
            .fetch_all(ResourceKind::Apps, 21, |request| {
                let result = if request.page == 2 {
                    Err(ProviderError::UnexpectedStatus {
                        route: "apps",
                        status: 502,
                    })
                } else {
                    Ok(serve(request))
                };
                async move { result }
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Provider(ProviderError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn empty_listing_yields_no_records() {
        let fetcher = PaginatingFetcher::default();

        let records: Vec<u32> = fetcher
            .fetch_all(ResourceKind::Accounts, 1, |_| async { Ok(Page::empty()) })
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(fetcher.per_page(), PaginatingFetcher::DEFAULT_PER_PAGE);
    }
}
