//! Wallet-family resolution.
//!
//! One key-pair serves every EVM-compatible chain; a separate key-pair serves
//! the NullNet chain. There are no per-chain EVM wallets, so every chain id
//! other than "nullnet" resolves to the single Ethereum-family record.

use nw_api_types::{Session, WalletRecord};
use nw_storage::{CurrentWalletSlot, LegacyWalletCache};
use std::sync::{Arc, RwLock};

pub const NULLNET_CHAIN_ID: &str = "nullnet";
pub const NULLNET_WALLET_NAME: &str = "NullNet Wallet";
pub const ETHEREUM_WALLET_NAME: &str = "Ethereum Wallet";

pub fn is_nullnet_chain(chain_id: &str) -> bool {
    chain_id == NULLNET_CHAIN_ID
}

pub struct WalletStore {
    records: RwLock<Vec<WalletRecord>>,
    legacy_cache: Arc<LegacyWalletCache>,
}

impl WalletStore {
    pub fn new(legacy_cache: Arc<LegacyWalletCache>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            legacy_cache,
        }
    }

    /// Replace the record set wholesale from a fresh session (login or
    /// re-login). Records are never mutated individually.
    pub fn load_from_session(&self, session: &Session) {
        self.replace_wallets(session.user_wallets.clone());
    }

    pub fn replace_wallets(&self, wallets: Vec<WalletRecord>) {
        let mut records = self.records.write().expect("wallet records poisoned");
        *records = wallets;
    }

    pub fn clear(&self) {
        self.replace_wallets(Vec::new());
        self.legacy_cache.clear();
    }

    pub fn all_wallets(&self) -> Vec<WalletRecord> {
        let records = self.records.read().expect("wallet records poisoned");
        records.clone()
    }

    /// Resolve the wallet serving `chain_id`. `None` means no wallet is
    /// provisioned for that family — an expected condition, not an error;
    /// callers degrade to placeholder balances and a disabled send flow.
    pub fn wallet_for_chain(&self, chain_id: &str) -> Option<WalletRecord> {
        let target = if is_nullnet_chain(chain_id) {
            NULLNET_WALLET_NAME
        } else {
            ETHEREUM_WALLET_NAME
        };
        let records = self.records.read().expect("wallet records poisoned");
        records
            .iter()
            .find(|record| record.wallet_name == target)
            .cloned()
    }

    pub fn address_for_chain(&self, chain_id: &str) -> Option<String> {
        self.wallet_for_chain(chain_id)
            .map(|record| record.wallet_address.clone())
    }

    /// Refresh the denormalized current-wallet slot for legacy consumers.
    /// A chain without a wallet clears the slot rather than leaving stale
    /// values from a previous chain behind.
    pub fn update_current_wallet(&self, chain_id: &str) {
        match self.wallet_for_chain(chain_id) {
            Some(record) => self.legacy_cache.set(CurrentWalletSlot {
                wallet_address: record.wallet_address.clone(),
                wallet_key: record.wallet_key.clone().unwrap_or_default(),
                wallet_phrase: record.wallet_phrase.clone().unwrap_or_default(),
            }),
            None => self.legacy_cache.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, address: &str, key: Option<&str>) -> WalletRecord {
        WalletRecord {
            wallet_name: name.to_owned(),
            wallet_address: address.to_owned(),
            wallet_key: key.map(ToOwned::to_owned),
            wallet_phrase: None,
            id: format!("id-{address}"),
        }
    }

    fn store_with_both_wallets() -> (WalletStore, Arc<LegacyWalletCache>) {
        let cache = Arc::new(LegacyWalletCache::default());
        let store = WalletStore::new(cache.clone());
        store.replace_wallets(vec![
            record(ETHEREUM_WALLET_NAME, "0xeth", Some("0xethkey")),
            record(NULLNET_WALLET_NAME, "null1abc", Some("nullkey")),
        ]);
        (store, cache)
    }

    #[test]
    fn every_evm_chain_id_resolves_to_the_ethereum_record() {
        let (store, _cache) = store_with_both_wallets();
        for chain_id in ["ethereum", "sepolia", "polygon", "mumbai", "bsc", "flowTestnet"] {
            let wallet = store
                .wallet_for_chain(chain_id)
                .unwrap_or_else(|| panic!("wallet expected for {chain_id}"));
            assert_eq!(wallet.wallet_name, ETHEREUM_WALLET_NAME);
            assert_eq!(wallet.wallet_address, "0xeth");
        }
    }

    #[test]
    fn nullnet_resolves_to_the_nullnet_record_never_ethereum() {
        let (store, _cache) = store_with_both_wallets();
        let wallet = store
            .wallet_for_chain(NULLNET_CHAIN_ID)
            .expect("nullnet wallet expected");
        assert_eq!(wallet.wallet_name, NULLNET_WALLET_NAME);
        assert_eq!(wallet.wallet_address, "null1abc");
    }

    #[test]
    fn missing_wallet_family_returns_none_not_an_error() {
        let cache = Arc::new(LegacyWalletCache::default());
        let store = WalletStore::new(cache);
        store.replace_wallets(vec![record(ETHEREUM_WALLET_NAME, "0xeth", None)]);

        assert!(store.wallet_for_chain("nullnet").is_none());
        assert_eq!(store.address_for_chain("polygon").as_deref(), Some("0xeth"));

        store.clear();
        assert!(store.wallet_for_chain("ethereum").is_none());
    }

    #[test]
    fn update_current_wallet_refreshes_the_legacy_slot() {
        let (store, cache) = store_with_both_wallets();

        store.update_current_wallet("polygon");
        let slot = cache.get().expect("slot should be filled");
        assert_eq!(slot.wallet_address, "0xeth");
        assert_eq!(slot.wallet_key, "0xethkey");

        store.update_current_wallet("nullnet");
        let slot = cache.get().expect("slot should be refreshed");
        assert_eq!(slot.wallet_address, "null1abc");
    }

    #[test]
    fn update_current_wallet_clears_stale_slot_when_no_wallet_exists() {
        let cache = Arc::new(LegacyWalletCache::default());
        let store = WalletStore::new(cache.clone());
        store.replace_wallets(vec![record(ETHEREUM_WALLET_NAME, "0xeth", Some("0xethkey"))]);

        store.update_current_wallet("ethereum");
        assert!(cache.get().is_some());

        // no NullNet wallet provisioned: the ethereum values must not linger
        store.update_current_wallet("nullnet");
        assert!(cache.get().is_none());
    }
}
