mod auth;
mod error;
mod http;
mod paystack;

pub use auth::{SESSION_TTL_MS, logout};
pub use error::{BackendError, Result};
pub use http::HttpWalletBackend;
pub use paystack::PaystackGateway;

use async_trait::async_trait;
use nw_api_types::{
    ChainId, ChainInfo, PaymentInit, PaymentVerification, SendTokenRequest, Token, TokenBalance,
    TokenUsdBalance, TransactionsPage, WalletAddress,
};

/// The external wallet backend, reduced to the calls the client core makes.
/// Chain logic, signing, and RPC access all live behind this boundary.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    async fn supported_chains(&self) -> Result<Vec<ChainInfo>>;

    async fn tokens_for_chain(&self, chain: &ChainId) -> Result<Vec<Token>>;

    async fn balances(&self, chain: &ChainId, address: &WalletAddress)
    -> Result<Vec<TokenBalance>>;

    async fn native_balance(&self, chain: &ChainId, address: &WalletAddress) -> Result<String>;

    async fn token_usd_balance(
        &self,
        address: &WalletAddress,
        contract_address: &str,
        price_feed_id: &str,
        chain: &ChainId,
    ) -> Result<TokenUsdBalance>;

    async fn transactions(
        &self,
        chain: &ChainId,
        address: &WalletAddress,
        page: u32,
        offset: u32,
    ) -> Result<TransactionsPage>;

    async fn token_transactions(
        &self,
        chain: &ChainId,
        token: &str,
        address: &WalletAddress,
        page: u32,
        offset: u32,
    ) -> Result<TransactionsPage>;

    async fn update_current_chain(&self, user_id: &str, chain: &ChainId) -> Result<()>;

    async fn send_token(&self, request: &SendTokenRequest) -> Result<String>;
}

/// External payment gateway: create a checkout session, then verify a
/// reference until it reaches a terminal status.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, amount: &str, email: &str) -> Result<PaymentInit>;

    async fn verify(&self, reference: &str) -> Result<PaymentVerification>;
}
