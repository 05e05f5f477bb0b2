//! Response envelopes for the external wallet backend.
//!
//! Every endpoint wraps its payload in `{ success, data?, error? }`; the
//! structs here mirror that shape field for field so decoding failures are
//! visible instead of silently defaulted.

use serde::{Deserialize, Serialize};

use crate::{Token, TransactionRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedChainsResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ChainList>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainList {
    pub chains: Vec<ChainInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default)]
    pub block_explorer: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainTokensResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<TokenList>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenList {
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<BalanceList>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceList {
    pub balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeBalanceResponse {
    pub success: bool,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsdBalanceResponse {
    pub success: bool,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub token_price: Option<f64>,
    #[serde(default)]
    pub usd_balance: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub success: bool,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Bare acknowledgement envelope, used by the current-chain update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentChainUpdate {
    pub chain_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTokenRequest {
    pub amount: String,
    pub receiver_wallet_address: String,
    pub token_to_send: String,
    pub sender_wallet_address: String,
    pub sender_private_key: String,
    pub chain_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTokenResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<SendTokenData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTokenData {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<RefreshTokenData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenData {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
}
