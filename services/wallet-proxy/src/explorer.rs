//! Legacy block-explorer client, used as the fallback for chains the wallet
//! backend does not index. Responses come back in the explorer's
//! `{ status, message, result }` shape and are normalized by the routes.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_EXPLORER_URL: &str = "https://api-sepolia.etherscan.io";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) struct ExplorerClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl ExplorerClient {
    pub(crate) fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("explorer client construction")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Reads `EXPLORER_URL` and `ETHERSCAN_KEY` from the environment.
    pub(crate) fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("EXPLORER_URL").unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_owned());
        let api_key = std::env::var("ETHERSCAN_KEY").unwrap_or_default();
        Self::new(base_url, api_key)
    }

    pub(crate) async fn native_balance(&self, address: &str) -> Result<Value> {
        let url = format!(
            "{}/api?module=account&action=balance&address={}&tag=latest&apikey={}",
            self.base_url, address, self.api_key
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("explorer balance transport")?;
        response.json().await.context("explorer balance parse")
    }

    pub(crate) async fn transactions(
        &self,
        address: &str,
        page: u32,
        offset: u32,
    ) -> Result<Value> {
        let url = format!(
            "{}/api?module=account&action=txlist&address={}&startblock=0&endblock=99999999&page={}&offset={}&sort=desc&apikey={}",
            self.base_url, address, page, offset, self.api_key
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("explorer txlist transport")?;
        response.json().await.context("explorer txlist parse")
    }
}
