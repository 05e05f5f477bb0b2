//! Token USD balance aggregation.
//!
//! A static configuration table maps (chain, symbol) to the backend
//! price-feed id and contract address. Tokens outside the table are a hard
//! error here — callers that want a number anyway use the flat native-rate
//! fallback, which is always labeled an estimate.

use nw_api_types::{ChainId, TokenUsdBalance, WalletAddress};
use nw_backend_client::{BackendError, WalletBackend};
use std::sync::Arc;
use thiserror::Error;

/// Contract-address sentinel the backend expects for native tokens.
pub const NATIVE_CONTRACT_SENTINEL: &str = "null";

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("token {symbol} is not supported on chain {chain}")]
    UnsupportedToken { symbol: String, chain: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenFeedConfig {
    pub price_feed_id: &'static str,
    pub contract_address: Option<&'static str>,
}

const fn feed(price_feed_id: &'static str, contract_address: Option<&'static str>) -> TokenFeedConfig {
    TokenFeedConfig {
        price_feed_id,
        contract_address,
    }
}

/// Price-feed configuration per chain and symbol, mirroring the backend's
/// token registry. Symbols are matched exactly as listed.
pub fn token_config(chain_id: &str, symbol: &str) -> Option<TokenFeedConfig> {
    let config = match (chain_id, symbol) {
        ("ethereum", "ETH") => feed("ethereum", None),
        ("ethereum", "USDT") => feed("tether", Some("0xdAC17F958D2ee523a2206206994597C13D831ec7")),
        ("ethereum", "USDC") => feed("usd-coin", Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
        ("ethereum", "DAI") => feed("dai", Some("0x6B175474E89094C44Da98b954EedeAC495271d0F")),

        ("sepolia", "ETH") => feed("ethereum", None),
        ("sepolia", "USDT") => feed("tether", Some("0x6f14C02Fc1F78322cFd7d707aB90f18baD3B54f5")),
        ("sepolia", "USDC") => feed("usd-coin", Some("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238")),

        ("polygon", "MATIC") => feed("matic-network", None),
        ("polygon", "USDT") => feed("tether", Some("0xc2132D05D31c914a87C6611C10748AEb04B58e8F")),
        ("polygon", "USDC") => feed("usd-coin", Some("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174")),
        ("polygon", "DAI") => feed("dai", Some("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063")),

        ("mumbai", "MATIC") => feed("matic-network", None),
        ("mumbai", "USDT") => feed("tether", Some("0xA02f6adc7926efeBBd59Fd43A84f4E0c0c91e832")),
        ("mumbai", "USDC") => feed("usd-coin", Some("0xe6b8a5CF854791412c1f6EFC7CAf629f5Df1c747")),

        ("bsc", "BNB") => feed("binancecoin", None),
        ("bsc", "USDT") => feed("tether", Some("0x55d398326f99059fF775485246999027B3197955")),
        ("bsc", "BUSD") => feed("binance-usd", Some("0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56")),
        ("bsc", "CAKE") => feed(
            "pancakeswap-token",
            Some("0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82"),
        ),

        ("bscTestnet", "BNB") => feed("binancecoin", None),
        ("bscTestnet", "USDT") => feed("tether", Some("0x337610d27c682E347C9cD60BD4b3b107C9d34dDd")),
        ("bscTestnet", "BUSD") => {
            feed("binance-usd", Some("0x78867BbEeF44f2326bF8DDd1941a4439382EF2A7"))
        }

        ("flowTestnet", "FLOW") => feed("flow", None),
        ("flowTestnet", "USDT") => {
            feed("tether", Some("0x5FbDB2315678afecb367f032d93F642f64180aa3"))
        }
        ("flowTestnet", "USDC") => {
            feed("usd-coin", Some("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"))
        }

        _ => return None,
    };
    Some(config)
}

pub fn supported_tokens(chain_id: &str) -> Vec<&'static str> {
    match chain_id {
        "ethereum" => vec!["ETH", "USDT", "USDC", "DAI"],
        "sepolia" => vec!["ETH", "USDT", "USDC"],
        "polygon" => vec!["MATIC", "USDT", "USDC", "DAI"],
        "mumbai" => vec!["MATIC", "USDT", "USDC"],
        "bsc" => vec!["BNB", "USDT", "BUSD", "CAKE"],
        "bscTestnet" => vec!["BNB", "USDT", "BUSD"],
        "flowTestnet" => vec!["FLOW", "USDT", "USDC"],
        _ => Vec::new(),
    }
}

pub struct BalanceAggregator {
    backend: Arc<dyn WalletBackend>,
}

impl BalanceAggregator {
    pub fn new(backend: Arc<dyn WalletBackend>) -> Self {
        Self { backend }
    }

    /// Resolve balance, price, and USD value for one token. The backend
    /// computes all three so no two screens disagree on rounding. An
    /// unconfigured (chain, symbol) pair fails fast instead of returning a
    /// silent zero.
    pub async fn fetch_token_usd_balance(
        &self,
        address: &str,
        symbol: &str,
        chain_id: &str,
    ) -> Result<TokenUsdBalance, BalanceError> {
        let config = token_config(chain_id, symbol).ok_or_else(|| BalanceError::UnsupportedToken {
            symbol: symbol.to_owned(),
            chain: chain_id.to_owned(),
        })?;

        let contract = config.contract_address.unwrap_or(NATIVE_CONTRACT_SENTINEL);
        let result = self
            .backend
            .token_usd_balance(
                &WalletAddress(address.to_owned()),
                contract,
                config.price_feed_id,
                &ChainId(chain_id.to_owned()),
            )
            .await?;
        Ok(result)
    }
}

/// Source of flat per-chain native-token rates. The static snapshot below is
/// a placeholder, not a live feed; swap in a real implementation to get
/// accurate pricing.
pub trait NativeRateSource: Send + Sync {
    fn native_rate(&self, chain_id: &str) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticRateTable;

impl NativeRateSource for StaticRateTable {
    fn native_rate(&self, chain_id: &str) -> f64 {
        match chain_id {
            "ethereum" | "sepolia" => 2303.0,
            "polygon" | "mumbai" => 0.8,
            "bsc" | "bscTestnet" => 242.0,
            // NullNet prices come from individual assets
            "nullnet" => 0.0,
            "flowTestnet" => 1.2,
            _ => 1.0,
        }
    }
}

/// USD value computed from the flat rate table rather than the backend.
/// `estimated` is always true; render these with an estimate marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsdEstimate {
    pub usd_value: f64,
    pub rate: f64,
    pub estimated: bool,
}

pub fn estimate_native_usd(
    rates: &dyn NativeRateSource,
    chain_id: &str,
    balance: f64,
) -> UsdEstimate {
    let rate = rates.native_rate(chain_id);
    UsdEstimate {
        usd_value: balance * rate,
        rate,
        estimated: true,
    }
}
