//! Send-token orchestration.
//!
//! Validates the form input, resolves the sender wallet for the active
//! chain, and submits through the backend. A chain without a wallet (or a
//! watch-only record without a key) disables sending with a typed error.

use nw_api_types::SendTokenRequest;
use nw_backend_client::{BackendError, WalletBackend};
use thiserror::Error;

use crate::wallet_store::WalletStore;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("receiver address is required")]
    MissingReceiver,

    #[error("no wallet available for chain {0}")]
    NoWallet(String),

    #[error("wallet for chain {0} has no signing key")]
    MissingKey(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct SendParams {
    pub amount: String,
    pub receiver: String,
    pub token: String,
}

/// Submit a token transfer on `chain_id`, returning the transaction hash.
pub async fn send_token(
    backend: &dyn WalletBackend,
    wallets: &WalletStore,
    chain_id: &str,
    params: &SendParams,
) -> Result<String, SendError> {
    let amount: f64 = params
        .amount
        .trim()
        .parse()
        .map_err(|_| SendError::InvalidAmount)?;
    if amount <= 0.0 || !amount.is_finite() {
        return Err(SendError::InvalidAmount);
    }

    let receiver = params.receiver.trim();
    if receiver.is_empty() {
        return Err(SendError::MissingReceiver);
    }

    let wallet = wallets
        .wallet_for_chain(chain_id)
        .ok_or_else(|| SendError::NoWallet(chain_id.to_owned()))?;
    let sender_private_key = wallet
        .wallet_key
        .clone()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| SendError::MissingKey(chain_id.to_owned()))?;

    let request = SendTokenRequest {
        amount: params.amount.trim().to_owned(),
        receiver_wallet_address: receiver.to_owned(),
        token_to_send: params.token.clone(),
        sender_wallet_address: wallet.wallet_address.clone(),
        sender_private_key,
        chain_id: chain_id.to_owned(),
    };

    Ok(backend.send_token(&request).await?)
}
