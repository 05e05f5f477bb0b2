mod explorer;
mod payment;
mod wire;

pub use explorer::{ExplorerPayload, LegacyExplorerPayload, PayloadError};
pub use payment::{
    PaymentInit, PaymentInitResponse, PaymentStatus, PaymentVerification, PaymentVerifyResponse,
};
pub use wire::{
    AckResponse, BalanceList, BalancesResponse, ChainInfo, ChainList, ChainTokensResponse,
    CurrentChainUpdate, NativeBalanceResponse, NativeCurrency, RefreshTokenData,
    RefreshTokenRequest, RefreshTokenResponse, SendTokenData, SendTokenRequest, SendTokenResponse,
    SupportedChainsResponse, TokenBalance, TokenList, TokenUsdBalanceResponse,
    TransactionsResponse,
};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn is_nullnet(&self) -> bool {
        self.0 == "nullnet"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletAddress(pub String);

/// A network the wallet can operate against. Loaded once from the backend's
/// supported-chains list; `rate` is a static fallback USD price, not a live
/// quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub rate: f64,
    pub block_explorer: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Native,
    Erc20,
    Nullnet,
}

/// Per-chain token metadata. `balance` is merged in after a balance refresh;
/// token lists are recomputed on every chain switch, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub decimals: u8,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
}

/// One record per wallet family: the Ethereum record serves every EVM chain,
/// the NullNet record serves the NullNet chain. Key material is wiped from
/// memory on drop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub wallet_name: String,
    pub wallet_address: String,
    #[serde(default)]
    pub wallet_key: Option<String>,
    #[serde(default)]
    pub wallet_phrase: Option<String>,
    #[serde(rename = "_id")]
    pub id: String,
}

impl Drop for WalletRecord {
    fn drop(&mut self) {
        if let Some(key) = self.wallet_key.as_mut() {
            key.zeroize();
        }
        if let Some(phrase) = self.wallet_phrase.as_mut() {
            phrase.zeroize();
        }
    }
}

/// The single active client session. Created on login, replaced wholesale on
/// refresh, destroyed on logout or refresh failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub expires_at_epoch_ms: u128,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_wallets: Vec<WalletRecord>,
}

impl Session {
    pub fn is_expired(&self, now_epoch_ms: u128) -> bool {
        now_epoch_ms >= self.expires_at_epoch_ms
    }
}

/// Combined balance + price + USD value for one token, as computed by the
/// backend. The backend is the single source of truth here so that no two
/// screens disagree on rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenUsdBalance {
    pub balance: String,
    pub token_price: f64,
    pub usd_balance: f64,
}

/// One entry of a transaction-history page, in the wire shape shared by the
/// backend and the legacy explorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub is_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsPage {
    pub transactions: Vec<TransactionRecord>,
    pub total_count: u64,
}
