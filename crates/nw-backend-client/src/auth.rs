use crate::error::Result;
use nw_storage::{LegacyWalletCache, SessionStore};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifetime of an access token after a login or refresh, matching the
/// identity backend's issuance window.
pub const SESSION_TTL_MS: u128 = 60 * 60 * 1000;

pub(crate) fn epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// Destroy the active session and the legacy wallet mirror. Safe to call
/// with no session present.
pub async fn logout(sessions: &dyn SessionStore, legacy_cache: &LegacyWalletCache) -> Result<()> {
    sessions.clear_session().await?;
    legacy_cache.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nw_api_types::Session;
    use nw_storage::{CurrentWalletSlot, InMemoryStore};

    #[tokio::test]
    async fn logout_clears_session_and_legacy_mirror() -> anyhow::Result<()> {
        let sessions = InMemoryStore::default();
        let cache = LegacyWalletCache::default();

        sessions
            .save_session(&Session {
                access_token: "a".to_owned(),
                refresh_token: "r".to_owned(),
                user_id: "u".to_owned(),
                expires_at_epoch_ms: u128::MAX,
                user_email: None,
                user_wallets: Vec::new(),
            })
            .await?;
        cache.set(CurrentWalletSlot {
            wallet_address: "0xabc".to_owned(),
            wallet_key: "0xkey".to_owned(),
            wallet_phrase: String::new(),
        });

        logout(&sessions, &cache).await?;

        assert!(sessions.load_session().await?.is_none());
        assert!(cache.get().is_none());
        Ok(())
    }
}
