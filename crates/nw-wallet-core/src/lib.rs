pub mod balance;
pub mod chain;
pub mod history;
pub mod payment;
pub mod send;
pub mod wallet_store;

pub use balance::{
    BalanceAggregator, BalanceError, NATIVE_CONTRACT_SENTINEL, NativeRateSource, StaticRateTable,
    TokenFeedConfig, UsdEstimate, estimate_native_usd, supported_tokens, token_config,
};
pub use chain::{ChainContext, ChainPhase, default_networks, merge_balances};
pub use history::{DEFAULT_PAGE_SIZE, HistoryPage, TransactionHistory};
pub use payment::{
    ActivePolls, CancelHandle, CancelToken, MAX_VERIFY_ATTEMPTS, PaymentError, PaymentFlow,
    PaymentPhase, PaymentPoller, PollConfig, PollGuard, PollOutcome, TIMEOUT_MESSAGE,
    VERIFY_INTERVAL, cancel_pair, status_message,
};
pub use send::{SendError, SendParams, send_token};
pub use wallet_store::{
    ETHEREUM_WALLET_NAME, NULLNET_CHAIN_ID, NULLNET_WALLET_NAME, WalletStore, is_nullnet_chain,
};
