//! Reqwest implementation of [`WalletBackend`].
//!
//! Every call carries the session's bearer token when one exists. A 401
//! answer triggers exactly one refresh-token exchange and one retry; a second
//! 401 (or a failed refresh) clears the session and surfaces
//! `SessionExpired`. Requests time out after 10 seconds so a hung backend
//! cannot stall a balance refresh indefinitely.

use async_trait::async_trait;
use nw_api_types::{
    AckResponse, BalancesResponse, ChainId, ChainInfo, ChainTokensResponse, CurrentChainUpdate,
    NativeBalanceResponse, RefreshTokenRequest, RefreshTokenResponse, SendTokenRequest,
    SendTokenResponse, Session, SupportedChainsResponse, Token, TokenBalance, TokenUsdBalance,
    TokenUsdBalanceResponse, TransactionsPage, TransactionsResponse, WalletAddress,
};
use nw_storage::SessionStore;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::auth::{SESSION_TTL_MS, epoch_ms};
use crate::error::{BackendError, Result};
use crate::WalletBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpWalletBackend {
    base_url: String,
    http: Client,
    sessions: Arc<dyn SessionStore>,
}

impl HttpWalletBackend {
    pub fn new(base_url: impl Into<String>, sessions: Arc<dyn SessionStore>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url,
            http,
            sessions,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn bearer(&self) -> Result<Option<String>> {
        Ok(self
            .sessions
            .load_session()
            .await?
            .map(|session| session.access_token))
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(json);
        }
        Ok(request.send().await?)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let bearer = self.bearer().await?;
        let response = self
            .dispatch(method.clone(), path, body, bearer.as_deref())
            .await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            // One refresh exchange, one retry. Never a loop.
            let token = self.refresh_session().await?;
            let retry = self.dispatch(method, path, body, Some(&token)).await?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                self.sessions.clear_session().await?;
                return Err(BackendError::SessionExpired);
            }
            retry
        } else {
            response
        };

        read_json(response).await
    }

    async fn refresh_session(&self) -> Result<String> {
        let Some(session) = self.sessions.load_session().await? else {
            return Err(BackendError::NoSession);
        };

        let request = RefreshTokenRequest {
            refresh_token: session.refresh_token.clone(),
        };
        let outcome = self
            .http
            .post(self.url("/api/auth/refresh-token"))
            .json(&request)
            .send()
            .await;

        let refreshed = match outcome {
            Ok(response) => match read_json::<RefreshTokenResponse>(response).await {
                Ok(envelope) if envelope.success => envelope.data,
                Ok(_) | Err(_) => None,
            },
            Err(err) => {
                warn!("refresh-token exchange transport failure: {err}");
                None
            }
        };

        let Some(data) = refreshed else {
            self.sessions.clear_session().await?;
            return Err(BackendError::SessionExpired);
        };

        let renewed = Session {
            access_token: data.access_token.clone(),
            refresh_token: data.refresh_token,
            user_id: data.user_id,
            expires_at_epoch_ms: epoch_ms() + SESSION_TTL_MS,
            user_email: session.user_email.clone(),
            user_wallets: session.user_wallets.clone(),
        };
        self.sessions.save_session(&renewed).await?;

        Ok(data.access_token)
    }
}

/// Read a response body as JSON, mapping non-2xx statuses to `Api` and
/// malformed bodies to `Decode`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::Api(format!("HTTP {status}: {text}")));
    }
    serde_json::from_str(&text).map_err(|err| BackendError::Decode(format!("{err}; raw: {text}")))
}

fn envelope_error(error: Option<String>, fallback: &str) -> BackendError {
    BackendError::Api(error.unwrap_or_else(|| fallback.to_owned()))
}

#[async_trait]
impl WalletBackend for HttpWalletBackend {
    async fn supported_chains(&self) -> Result<Vec<ChainInfo>> {
        let envelope: SupportedChainsResponse =
            self.execute(Method::GET, "/wallet/supported", None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "supported-chains fetch failed"));
        }
        let data = envelope
            .data
            .ok_or_else(|| BackendError::Decode("supported-chains envelope missing data".to_owned()))?;
        Ok(data.chains)
    }

    async fn tokens_for_chain(&self, chain: &ChainId) -> Result<Vec<Token>> {
        let path = format!("/wallet/chains/{}/tokens", chain.0);
        let envelope: ChainTokensResponse = self.execute(Method::GET, &path, None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "token metadata fetch failed"));
        }
        let data = envelope
            .data
            .ok_or_else(|| BackendError::Decode("token envelope missing data".to_owned()))?;
        Ok(data.tokens)
    }

    async fn balances(
        &self,
        chain: &ChainId,
        address: &WalletAddress,
    ) -> Result<Vec<TokenBalance>> {
        let path = format!("/wallet/balances/{}/{}", chain.0, address.0);
        let envelope: BalancesResponse = self.execute(Method::GET, &path, None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "balance fetch failed"));
        }
        let data = envelope
            .data
            .ok_or_else(|| BackendError::Decode("balances envelope missing data".to_owned()))?;
        Ok(data.balances)
    }

    async fn native_balance(&self, chain: &ChainId, address: &WalletAddress) -> Result<String> {
        let path = format!("/wallet/balance/{}/{}", chain.0, address.0);
        let envelope: NativeBalanceResponse = self.execute(Method::GET, &path, None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "native balance fetch failed"));
        }
        envelope
            .balance
            .ok_or_else(|| BackendError::Decode("balance envelope missing balance".to_owned()))
    }

    async fn token_usd_balance(
        &self,
        address: &WalletAddress,
        contract_address: &str,
        price_feed_id: &str,
        chain: &ChainId,
    ) -> Result<TokenUsdBalance> {
        let path = format!(
            "/wallet/get-token-usd-balance/{}/{}/{}/{}",
            address.0, contract_address, price_feed_id, chain.0
        );
        let envelope: TokenUsdBalanceResponse = self.execute(Method::GET, &path, None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "token USD balance fetch failed"));
        }
        match (envelope.balance, envelope.token_price, envelope.usd_balance) {
            (Some(balance), Some(token_price), Some(usd_balance)) => Ok(TokenUsdBalance {
                balance,
                token_price,
                usd_balance,
            }),
            _ => Err(BackendError::Decode(
                "token USD balance envelope missing balance/price fields".to_owned(),
            )),
        }
    }

    async fn transactions(
        &self,
        chain: &ChainId,
        address: &WalletAddress,
        page: u32,
        offset: u32,
    ) -> Result<TransactionsPage> {
        let path = format!(
            "/wallet/transactions/{}/{}?page={}&offset={}",
            chain.0, address.0, page, offset
        );
        let envelope: TransactionsResponse = self.execute(Method::GET, &path, None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "transaction fetch failed"));
        }
        let total_count = envelope
            .total_count
            .unwrap_or(envelope.transactions.len() as u64);
        Ok(TransactionsPage {
            transactions: envelope.transactions,
            total_count,
        })
    }

    async fn token_transactions(
        &self,
        chain: &ChainId,
        token: &str,
        address: &WalletAddress,
        page: u32,
        offset: u32,
    ) -> Result<TransactionsPage> {
        let path = format!(
            "/wallet/token-transactions/{}/{}/{}?page={}&offset={}",
            chain.0, token, address.0, page, offset
        );
        let envelope: TransactionsResponse = self.execute(Method::GET, &path, None).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "token transaction fetch failed"));
        }
        let total_count = envelope
            .total_count
            .unwrap_or(envelope.transactions.len() as u64);
        Ok(TransactionsPage {
            transactions: envelope.transactions,
            total_count,
        })
    }

    async fn update_current_chain(&self, user_id: &str, chain: &ChainId) -> Result<()> {
        let path = format!("/wallet/user/{user_id}/current-chain");
        let body = serde_json::to_value(CurrentChainUpdate {
            chain_id: chain.0.clone(),
        })
        .map_err(|err| BackendError::Decode(err.to_string()))?;
        let envelope: AckResponse = self.execute(Method::PUT, &path, Some(&body)).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "current-chain update failed"));
        }
        Ok(())
    }

    async fn send_token(&self, request: &SendTokenRequest) -> Result<String> {
        let body = serde_json::to_value(request)
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        let envelope: SendTokenResponse = self
            .execute(Method::POST, "/wallet/send-token", Some(&body))
            .await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error, "send-token failed"));
        }
        envelope
            .data
            .map(|data| data.hash)
            .ok_or_else(|| BackendError::Decode("send-token envelope missing hash".to_owned()))
    }
}
