//! Transaction-history pagination over the backend.

use nw_api_types::{ChainId, TransactionRecord, WalletAddress};
use nw_backend_client::{BackendError, WalletBackend};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub transactions: Vec<TransactionRecord>,
    pub total_count: u64,
    pub page: u32,
    pub offset: u32,
}

impl HistoryPage {
    pub fn empty(page: u32, offset: u32) -> Self {
        Self {
            transactions: Vec::new(),
            total_count: 0,
            page,
            offset,
        }
    }

    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.offset) < self.total_count
    }
}

pub struct TransactionHistory {
    backend: Arc<dyn WalletBackend>,
}

impl TransactionHistory {
    pub fn new(backend: Arc<dyn WalletBackend>) -> Self {
        Self { backend }
    }

    pub async fn fetch_page(
        &self,
        chain_id: &str,
        address: &str,
        page: u32,
        offset: u32,
    ) -> Result<HistoryPage, BackendError> {
        let result = self
            .backend
            .transactions(
                &ChainId(chain_id.to_owned()),
                &WalletAddress(address.to_owned()),
                page,
                offset,
            )
            .await?;
        Ok(HistoryPage {
            transactions: result.transactions,
            total_count: result.total_count,
            page,
            offset,
        })
    }

    /// Same as `fetch_page`, but transient failures collapse to an empty
    /// page so the history view settles instead of spinning.
    pub async fn fetch_page_or_empty(
        &self,
        chain_id: &str,
        address: &str,
        page: u32,
        offset: u32,
    ) -> HistoryPage {
        match self.fetch_page(chain_id, address, page, offset).await {
            Ok(history) => history,
            Err(err) => {
                warn!("failed to fetch transactions for {chain_id}/{address}: {err}");
                HistoryPage::empty(page, offset)
            }
        }
    }
}
