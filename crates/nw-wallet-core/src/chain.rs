//! Chain registry and current-network state machine.
//!
//! Lifecycle: Uninitialized → Loading → Ready, with a Switching sub-state
//! while a chain change is in flight. The context must never end up with
//! zero selectable networks: a failed supported-chains fetch falls back to a
//! hardcoded list. Token refreshes are tagged with a generation counter so a
//! late response for a chain the user has already left is discarded.

use nw_api_types::{ChainId, ChainInfo, Network, Token, TokenBalance, WalletAddress};
use nw_backend_client::WalletBackend;
use nw_storage::PreferenceStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::balance::NativeRateSource;
use crate::wallet_store::WalletStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainPhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Switching,
}

#[derive(Default)]
struct ChainState {
    phase: ChainPhase,
    networks: Vec<Network>,
    current: Option<Network>,
    tokens: Vec<Token>,
}

pub struct ChainContext {
    backend: Arc<dyn WalletBackend>,
    prefs: Arc<dyn PreferenceStore>,
    wallets: Arc<WalletStore>,
    rates: Arc<dyn NativeRateSource>,
    state: RwLock<ChainState>,
    refresh_generation: AtomicU64,
    user_id: std::sync::RwLock<Option<String>>,
}

impl ChainContext {
    pub fn new(
        backend: Arc<dyn WalletBackend>,
        prefs: Arc<dyn PreferenceStore>,
        wallets: Arc<WalletStore>,
        rates: Arc<dyn NativeRateSource>,
    ) -> Self {
        Self {
            backend,
            prefs,
            wallets,
            rates,
            state: RwLock::new(ChainState::default()),
            refresh_generation: AtomicU64::new(0),
            user_id: std::sync::RwLock::new(None),
        }
    }

    /// Set the user whose backend current-chain record is kept in sync on
    /// switches. No user means the backend update is skipped.
    pub fn set_user(&self, user_id: Option<String>) {
        let mut guard = self.user_id.write().expect("user id poisoned");
        *guard = user_id;
    }

    pub async fn phase(&self) -> ChainPhase {
        self.state.read().await.phase
    }

    pub async fn networks(&self) -> Vec<Network> {
        self.state.read().await.networks.clone()
    }

    pub async fn current_network(&self) -> Option<Network> {
        self.state.read().await.current.clone()
    }

    pub async fn tokens(&self) -> Vec<Token> {
        self.state.read().await.tokens.clone()
    }

    /// First-mount initialization: fetch the supported-chains list, restore
    /// the persisted network selection when it is still valid, then load the
    /// token list for the selected network. Always ends in Ready.
    pub async fn initialize(&self) {
        {
            let mut state = self.state.write().await;
            state.phase = ChainPhase::Loading;
        }

        let fetched = match self.backend.supported_chains().await {
            Ok(chains) if !chains.is_empty() => Some(
                chains
                    .into_iter()
                    .map(|chain| self.network_from_chain(chain))
                    .collect::<Vec<_>>(),
            ),
            Ok(_) => {
                warn!("supported-chains list was empty; using fallback networks");
                None
            }
            Err(err) => {
                warn!("failed to fetch supported chains: {err}; using fallback networks");
                None
            }
        };

        // The saved selection is only restored against a fetched list; the
        // fallback list always starts from its first entry.
        let (networks, current) = match fetched {
            Some(networks) => {
                let saved = match self.prefs.load_selected_network().await {
                    Ok(saved) => saved,
                    Err(err) => {
                        warn!("failed to load selected network: {err}");
                        None
                    }
                };
                let current = saved
                    .and_then(|id| networks.iter().find(|network| network.id == id).cloned())
                    .or_else(|| networks.first().cloned());
                (networks, current)
            }
            None => {
                let networks = default_networks();
                let current = networks.first().cloned();
                (networks, current)
            }
        };

        {
            let mut state = self.state.write().await;
            state.networks = networks;
            state.current = current.clone();
            state.phase = ChainPhase::Ready;
        }

        if let Some(network) = current {
            info!("chain context ready; current network {}", network.id);
            self.refresh_tokens(&network.id).await;
        }
    }

    fn network_from_chain(&self, chain: ChainInfo) -> Network {
        Network {
            rate: self.rates.native_rate(&chain.id),
            symbol: chain
                .native_currency
                .map(|currency| currency.symbol)
                .unwrap_or_else(|| "ETH".to_owned()),
            block_explorer: chain.block_explorer.unwrap_or_else(|| "#".to_owned()),
            id: chain.id,
            name: chain.name,
            chain_id: chain.chain_id,
            rpc_url: chain.rpc_url,
        }
    }

    /// Switch the current network. Unknown ids are a logged no-op. The
    /// wallet cache is refreshed before the token fetch starts, and the
    /// backend current-chain update is fire-and-forget.
    pub async fn switch_network(&self, network_id: &str) {
        let target = {
            let state = self.state.read().await;
            state
                .networks
                .iter()
                .find(|network| network.id == network_id)
                .cloned()
        };
        let Some(network) = target else {
            error!("network not found: {network_id}");
            return;
        };

        {
            let mut state = self.state.write().await;
            state.phase = ChainPhase::Switching;
            state.current = Some(network);
        }

        if let Err(err) = self.prefs.save_selected_network(network_id).await {
            warn!("failed to persist selected network: {err}");
        }

        self.wallets.update_current_wallet(network_id);

        let user = self.user_id.read().expect("user id poisoned").clone();
        if let Some(user_id) = user {
            let backend = self.backend.clone();
            let chain = ChainId(network_id.to_owned());
            tokio::spawn(async move {
                if let Err(err) = backend.update_current_chain(&user_id, &chain).await {
                    warn!("failed to update current chain on backend: {err}");
                }
            });
        }

        self.refresh_tokens(network_id).await;

        {
            let mut state = self.state.write().await;
            state.phase = ChainPhase::Ready;
        }
        info!("network switch completed: {network_id}");
    }

    async fn refresh_tokens(&self, chain_id: &str) {
        let generation = self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tokens = self.tokens_for_chain(chain_id).await;

        if self.refresh_generation.load(Ordering::SeqCst) != generation {
            debug!("discarding stale token refresh for chain {chain_id}");
            return;
        }

        let mut state = self.state.write().await;
        state.tokens = tokens;
    }

    /// Fetch the token list for a chain, merging wallet balances in when a
    /// wallet address resolves. Metadata failure yields an empty list;
    /// balance failure yields metadata-only tokens. Neither propagates.
    pub async fn tokens_for_chain(&self, chain_id: &str) -> Vec<Token> {
        let chain = ChainId(chain_id.to_owned());
        let metadata = match self.backend.tokens_for_chain(&chain).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!("no token metadata for chain {chain_id}: {err}");
                return Vec::new();
            }
        };

        let Some(address) = self.wallets.address_for_chain(chain_id) else {
            debug!("no wallet address for chain {chain_id}; returning token metadata only");
            return metadata;
        };

        let balances = match self
            .backend
            .balances(&chain, &WalletAddress(address))
            .await
        {
            Ok(balances) => balances,
            Err(err) => {
                warn!("failed to fetch balances for chain {chain_id}: {err}");
                return metadata;
            }
        };

        merge_balances(metadata, &balances)
    }
}

/// Merge fetched balances into token metadata by case-insensitive symbol
/// match. Tokens without a balance entry default to "0".
pub fn merge_balances(metadata: Vec<Token>, balances: &[TokenBalance]) -> Vec<Token> {
    metadata
        .into_iter()
        .map(|mut token| {
            let matched = balances
                .iter()
                .find(|balance| balance.symbol.eq_ignore_ascii_case(&token.symbol));
            token.balance = Some(
                matched
                    .map(|balance| balance.balance.clone())
                    .unwrap_or_else(|| "0".to_owned()),
            );
            token
        })
        .collect()
}

/// Hardcoded network list used when the supported-chains fetch fails. The
/// system must never be left with zero selectable networks.
pub fn default_networks() -> Vec<Network> {
    vec![
        Network {
            id: "ethereum".to_owned(),
            name: "Ethereum".to_owned(),
            symbol: "ETH".to_owned(),
            rate: 2303.0,
            block_explorer: "https://sepolia.etherscan.io".to_owned(),
            chain_id: None,
            rpc_url: None,
        },
        Network {
            id: "polygon".to_owned(),
            name: "Polygon".to_owned(),
            symbol: "MATIC".to_owned(),
            rate: 0.8,
            block_explorer: "https://mumbai.polygonscan.com".to_owned(),
            chain_id: None,
            rpc_url: None,
        },
        Network {
            id: "bsc".to_owned(),
            name: "BSC".to_owned(),
            symbol: "BNB".to_owned(),
            rate: 242.0,
            block_explorer: "https://bscscan.com".to_owned(),
            chain_id: None,
            rpc_url: None,
        },
        Network {
            id: "nullnet".to_owned(),
            name: "NullNet".to_owned(),
            symbol: "NULL".to_owned(),
            rate: 1.0,
            block_explorer: "#".to_owned(),
            chain_id: None,
            rpc_url: None,
        },
        Network {
            id: "flowTestnet".to_owned(),
            name: "Flow EVM Testnet".to_owned(),
            symbol: "FLOW".to_owned(),
            rate: 1.2,
            block_explorer: "https://evm-testnet.flowscan.io".to_owned(),
            chain_id: None,
            rpc_url: None,
        },
    ]
}
