use anyhow::Result;
use async_trait::async_trait;
use nw_api_types::Session;
use rocksdb::{DB, Options};
use std::sync::{Arc, RwLock as SyncRwLock};
use tokio::sync::RwLock;

const SESSION_KEY: &str = "session:current";
const SELECTED_NETWORK_KEY: &str = "pref:selected-network";

/// Persistence for the single active session. One session per client;
/// `save_session` replaces wholesale.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_session(&self, session: &Session) -> Result<()>;
    async fn load_session(&self) -> Result<Option<Session>>;
    async fn clear_session(&self) -> Result<()>;
}

/// Durable user preferences that outlive the session, currently just the
/// selected network id.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn save_selected_network(&self, chain_id: &str) -> Result<()>;
    async fn load_selected_network(&self) -> Result<Option<String>>;
}

#[derive(Default)]
pub struct InMemoryStore {
    session: RwLock<Option<Session>>,
    selected_network: RwLock<Option<String>>,
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn save_session(&self, session: &Session) -> Result<()> {
        let mut guard = self.session.write().await;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<Session>> {
        let guard = self.session.read().await;
        Ok(guard.clone())
    }

    async fn clear_session(&self) -> Result<()> {
        let mut guard = self.session.write().await;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn save_selected_network(&self, chain_id: &str) -> Result<()> {
        let mut guard = self.selected_network.write().await;
        *guard = Some(chain_id.to_owned());
        Ok(())
    }

    async fn load_selected_network(&self) -> Result<Option<String>> {
        let guard = self.selected_network.read().await;
        Ok(guard.clone())
    }
}

/// Embedded key-value store backing both the session and preferences, with
/// prefix-separated keys in a single DB.
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    pub fn open_default(path: &str) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path)?;
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl SessionStore for RocksDbStore {
    async fn save_session(&self, session: &Session) -> Result<()> {
        let value = serde_json::to_vec(session)?;
        self.db.put(SESSION_KEY.as_bytes(), value)?;
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<Session>> {
        let value = self.db.get(SESSION_KEY.as_bytes())?;
        match value {
            Some(raw) => Ok(Some(serde_json::from_slice::<Session>(&raw)?)),
            None => Ok(None),
        }
    }

    async fn clear_session(&self) -> Result<()> {
        self.db.delete(SESSION_KEY.as_bytes())?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for RocksDbStore {
    async fn save_selected_network(&self, chain_id: &str) -> Result<()> {
        self.db
            .put(SELECTED_NETWORK_KEY.as_bytes(), chain_id.as_bytes())?;
        Ok(())
    }

    async fn load_selected_network(&self) -> Result<Option<String>> {
        let value = self.db.get(SELECTED_NETWORK_KEY.as_bytes())?;
        Ok(value.map(|raw| String::from_utf8_lossy(&raw).into_owned()))
    }
}

/// Denormalized "current wallet" slot kept for legacy consumers that read
/// address/key/phrase directly instead of resolving by chain. Must be
/// refreshed on every successful chain switch and cleared on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentWalletSlot {
    pub wallet_address: String,
    pub wallet_key: String,
    pub wallet_phrase: String,
}

#[derive(Default)]
pub struct LegacyWalletCache {
    slot: SyncRwLock<Option<CurrentWalletSlot>>,
}

impl LegacyWalletCache {
    pub fn set(&self, slot: CurrentWalletSlot) {
        let mut guard = self.slot.write().expect("legacy wallet cache poisoned");
        *guard = Some(slot);
    }

    pub fn get(&self) -> Option<CurrentWalletSlot> {
        let guard = self.slot.read().expect("legacy wallet cache poisoned");
        guard.clone()
    }

    pub fn clear(&self) {
        let mut guard = self.slot.write().expect("legacy wallet cache poisoned");
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nw_api_types::WalletRecord;

    fn sample_session() -> Session {
        Session {
            access_token: "access-1".to_owned(),
            refresh_token: "refresh-1".to_owned(),
            user_id: "user-1".to_owned(),
            expires_at_epoch_ms: 1_700_000_000_000,
            user_email: Some("user@example.com".to_owned()),
            user_wallets: vec![WalletRecord {
                wallet_name: "Ethereum Wallet".to_owned(),
                wallet_address: "0xabc".to_owned(),
                wallet_key: Some("0xkey".to_owned()),
                wallet_phrase: None,
                id: "w1".to_owned(),
            }],
        }
    }

    #[tokio::test]
    async fn in_memory_session_roundtrip_and_clear() -> Result<()> {
        let store = InMemoryStore::default();
        assert!(store.load_session().await?.is_none());

        store.save_session(&sample_session()).await?;
        let loaded = store.load_session().await?.expect("session should exist");
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.user_wallets.len(), 1);

        store.clear_session().await?;
        assert!(store.load_session().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn rocksdb_session_and_preference_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RocksDbStore::open_default(dir.path().to_str().expect("utf8 path"))?;

        store.save_session(&sample_session()).await?;
        let loaded = store.load_session().await?.expect("session should exist");
        assert_eq!(loaded.access_token, "access-1");
        assert_eq!(loaded.user_wallets[0].wallet_address, "0xabc");

        assert!(store.load_selected_network().await?.is_none());
        store.save_selected_network("polygon").await?;
        assert_eq!(
            store.load_selected_network().await?.as_deref(),
            Some("polygon")
        );

        store.clear_session().await?;
        assert!(store.load_session().await?.is_none());
        // clearing the session must not touch preferences
        assert_eq!(
            store.load_selected_network().await?.as_deref(),
            Some("polygon")
        );
        Ok(())
    }

    #[test]
    fn legacy_cache_set_get_clear() {
        let cache = LegacyWalletCache::default();
        assert!(cache.get().is_none());

        cache.set(CurrentWalletSlot {
            wallet_address: "0xabc".to_owned(),
            wallet_key: "0xkey".to_owned(),
            wallet_phrase: String::new(),
        });
        assert_eq!(
            cache.get().map(|slot| slot.wallet_address),
            Some("0xabc".to_owned())
        );

        cache.clear();
        assert!(cache.get().is_none());
    }
}
