use axum::{
    Json,
    extract::{Query, State},
};
use nw_api_types::{ChainId, ExplorerPayload, WalletAddress};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{ApiResult, AppState, bad_gateway, bad_request};

/// Chains the wallet backend indexes. Anything else falls back to the
/// legacy explorer for read endpoints.
const SUPPORTED_CHAINS: &[&str] = &[
    "ethereum",
    "polygon",
    "bsc",
    "sepolia",
    "mumbai",
    "bscTestnet",
    "nullnet",
    "flowTestnet",
];

fn is_supported(chain: &str) -> bool {
    SUPPORTED_CHAINS.contains(&chain)
}

fn require_address(address: Option<String>) -> Result<String, (axum::http::StatusCode, Json<crate::ErrorResponse>)> {
    address
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| bad_request("address is required"))
}

/// Map the legacy balance shape onto the native `{ success, balance }`
/// contract. The explorer reports the balance in its `result` field.
fn normalized_balance_envelope(payload: ExplorerPayload) -> Value {
    match payload {
        ExplorerPayload::Native(value) => value,
        ExplorerPayload::Legacy(legacy) => {
            if legacy.is_ok() {
                json!({ "success": true, "balance": legacy.result })
            } else {
                json!({ "success": false, "error": legacy.result })
            }
        }
    }
}

/// Map the legacy transaction-list shape onto the native envelope. The
/// explorer returns the page in `result` with no total count.
fn normalized_transactions_envelope(payload: ExplorerPayload) -> Value {
    match payload {
        ExplorerPayload::Native(value) => value,
        ExplorerPayload::Legacy(legacy) => {
            if legacy.is_ok() {
                let total = legacy.result.as_array().map(|list| list.len()).unwrap_or(0);
                json!({
                    "success": true,
                    "transactions": legacy.result,
                    "totalCount": total,
                })
            } else {
                json!({ "success": false, "error": legacy.result })
            }
        }
    }
}

fn classify_or_legacy_error(raw: Value) -> Result<ExplorerPayload, (axum::http::StatusCode, Json<crate::ErrorResponse>)> {
    ExplorerPayload::classify(raw).map_err(|err| {
        warn!("unrecognized explorer payload: {err}");
        bad_gateway("unrecognized upstream response")
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceQuery {
    address: Option<String>,
    chain: Option<String>,
}

pub(crate) async fn balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> ApiResult<Value> {
    let address = require_address(query.address)?;
    let chain = query.chain.unwrap_or_else(|| "ethereum".to_owned());

    if is_supported(&chain) {
        match state
            .backend
            .native_balance(&ChainId(chain), &WalletAddress(address))
            .await
        {
            Ok(balance) => Ok(Json(json!({ "success": true, "balance": balance }))),
            Err(err) => {
                warn!("balance fetch failed: {err}");
                Err(bad_gateway("failed to fetch balance"))
            }
        }
    } else {
        let raw = state.explorer.native_balance(&address).await.map_err(|err| {
            warn!("explorer balance fetch failed: {err}");
            bad_gateway("failed to fetch balance")
        })?;
        let payload = classify_or_legacy_error(raw)?;
        Ok(Json(normalized_balance_envelope(payload)))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalancesQuery {
    address: Option<String>,
    chain: Option<String>,
}

pub(crate) async fn balances(
    State(state): State<AppState>,
    Query(query): Query<BalancesQuery>,
) -> ApiResult<Value> {
    let address = require_address(query.address)?;
    let chain = query.chain.unwrap_or_else(|| "ethereum".to_owned());

    match state
        .backend
        .balances(&ChainId(chain), &WalletAddress(address))
        .await
    {
        Ok(balances) => Ok(Json(json!({
            "success": true,
            "data": { "balances": balances },
        }))),
        Err(err) => {
            warn!("balances fetch failed: {err}");
            Err(bad_gateway("failed to fetch balances"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBalanceQuery {
    address: Option<String>,
    token: Option<String>,
    chain: Option<String>,
    #[serde(rename = "contractAddress")]
    contract_address: Option<String>,
}

pub(crate) async fn token_balance(
    State(state): State<AppState>,
    Query(query): Query<TokenBalanceQuery>,
) -> ApiResult<Value> {
    let address = require_address(query.address)?;
    let token = query.token.unwrap_or_else(|| "ethereum".to_owned());
    let chain = query.chain.unwrap_or_else(|| "ethereum".to_owned());
    let contract_address = query.contract_address.unwrap_or_else(|| "null".to_owned());

    match state
        .backend
        .token_usd_balance(
            &WalletAddress(address),
            &contract_address,
            &token,
            &ChainId(chain),
        )
        .await
    {
        Ok(result) => Ok(Json(json!({
            "success": true,
            "balance": result.balance,
            "tokenPrice": result.token_price,
            "usdBalance": result.usd_balance,
        }))),
        Err(err) => {
            warn!("token USD balance fetch failed: {err}");
            Err(bad_gateway("failed to fetch token USD balance"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokensQuery {
    chain: Option<String>,
}

pub(crate) async fn tokens(
    State(state): State<AppState>,
    Query(query): Query<TokensQuery>,
) -> ApiResult<Value> {
    let Some(chain) = query.chain.filter(|value| !value.trim().is_empty()) else {
        return Err(bad_request("chain is required"));
    };

    match state.backend.tokens_for_chain(&ChainId(chain)).await {
        Ok(tokens) => Ok(Json(json!({
            "success": true,
            "data": { "tokens": tokens },
        }))),
        Err(err) => {
            warn!("token metadata fetch failed: {err}");
            Err(bad_gateway("failed to fetch tokens"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionsQuery {
    address: Option<String>,
    chain: Option<String>,
    page: Option<u32>,
    offset: Option<u32>,
}

pub(crate) async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<Value> {
    let address = require_address(query.address)?;
    let chain = query.chain.unwrap_or_else(|| "ethereum".to_owned());
    let page = query.page.unwrap_or(1);
    let offset = query.offset.unwrap_or(5);

    if is_supported(&chain) {
        match state
            .backend
            .transactions(&ChainId(chain), &WalletAddress(address), page, offset)
            .await
        {
            Ok(result) => Ok(Json(json!({
                "success": true,
                "transactions": result.transactions,
                "totalCount": result.total_count,
            }))),
            Err(err) => {
                warn!("transaction fetch failed: {err}");
                Err(bad_gateway("failed to fetch transactions"))
            }
        }
    } else {
        let raw = state
            .explorer
            .transactions(&address, page, offset)
            .await
            .map_err(|err| {
                warn!("explorer transaction fetch failed: {err}");
                bad_gateway("failed to fetch transactions")
            })?;
        let payload = classify_or_legacy_error(raw)?;
        Ok(Json(normalized_transactions_envelope(payload)))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenTransactionsQuery {
    address: Option<String>,
    chain: Option<String>,
    token: Option<String>,
    page: Option<u32>,
    offset: Option<u32>,
}

pub(crate) async fn token_transactions(
    State(state): State<AppState>,
    Query(query): Query<TokenTransactionsQuery>,
) -> ApiResult<Value> {
    let (Some(address), Some(chain), Some(token)) = (query.address, query.chain, query.token)
    else {
        return Err(bad_request(
            "Missing required parameters: address, chain, and token",
        ));
    };
    let page = query.page.unwrap_or(1);
    let offset = query.offset.unwrap_or(10);

    match state
        .backend
        .token_transactions(&ChainId(chain), &token, &WalletAddress(address), page, offset)
        .await
    {
        Ok(result) => Ok(Json(json!({
            "success": true,
            "transactions": result.transactions,
            "totalCount": result.total_count,
        }))),
        Err(err) => {
            warn!("token transaction fetch failed: {err}");
            Err(bad_gateway("failed to fetch token transactions"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, router};
    use crate::explorer::ExplorerClient;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use nw_api_types::{
        ChainInfo, LegacyExplorerPayload, SendTokenRequest, Token, TokenBalance, TokenUsdBalance,
        TransactionsPage,
    };
    use nw_backend_client::{BackendError, Result as BackendResult, WalletBackend};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubBackend {
        native_balance: Option<String>,
        balances: Option<Vec<TokenBalance>>,
        usd: Option<TokenUsdBalance>,
        tx_page: Option<TransactionsPage>,
    }

    fn unavailable(call: &str) -> BackendError {
        BackendError::Api(format!("{call} unavailable"))
    }

    #[async_trait]
    impl WalletBackend for StubBackend {
        async fn supported_chains(&self) -> BackendResult<Vec<ChainInfo>> {
            Err(unavailable("supported_chains"))
        }

        async fn tokens_for_chain(&self, _chain: &ChainId) -> BackendResult<Vec<Token>> {
            Err(unavailable("tokens_for_chain"))
        }

        async fn balances(
            &self,
            _chain: &ChainId,
            _address: &WalletAddress,
        ) -> BackendResult<Vec<TokenBalance>> {
            self.balances
                .clone()
                .ok_or_else(|| unavailable("balances"))
        }

        async fn native_balance(
            &self,
            _chain: &ChainId,
            _address: &WalletAddress,
        ) -> BackendResult<String> {
            self.native_balance
                .clone()
                .ok_or_else(|| unavailable("native_balance"))
        }

        async fn token_usd_balance(
            &self,
            _address: &WalletAddress,
            _contract_address: &str,
            _price_feed_id: &str,
            _chain: &ChainId,
        ) -> BackendResult<TokenUsdBalance> {
            self.usd.clone().ok_or_else(|| unavailable("token_usd_balance"))
        }

        async fn transactions(
            &self,
            _chain: &ChainId,
            _address: &WalletAddress,
            _page: u32,
            _offset: u32,
        ) -> BackendResult<TransactionsPage> {
            self.tx_page.clone().ok_or_else(|| unavailable("transactions"))
        }

        async fn token_transactions(
            &self,
            _chain: &ChainId,
            _token: &str,
            _address: &WalletAddress,
            _page: u32,
            _offset: u32,
        ) -> BackendResult<TransactionsPage> {
            self.tx_page
                .clone()
                .ok_or_else(|| unavailable("token_transactions"))
        }

        async fn update_current_chain(
            &self,
            _user_id: &str,
            _chain: &ChainId,
        ) -> BackendResult<()> {
            Err(unavailable("update_current_chain"))
        }

        async fn send_token(&self, _request: &SendTokenRequest) -> BackendResult<String> {
            Err(unavailable("send_token"))
        }
    }

    fn legacy(status: &str, result: Value) -> ExplorerPayload {
        ExplorerPayload::Legacy(LegacyExplorerPayload {
            status: status.to_owned(),
            message: String::new(),
            result,
        })
    }

    fn app(backend: StubBackend) -> axum::Router {
        router(AppState {
            backend: Arc::new(backend),
            explorer: Arc::new(
                ExplorerClient::new("http://localhost:1", "").expect("explorer client"),
            ),
        })
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    #[tokio::test]
    async fn missing_address_is_a_400_with_safe_envelope() {
        let (status, body) = get_json(app(StubBackend::default()), "/api/balance").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "address is required");
    }

    #[tokio::test]
    async fn supported_chain_balance_uses_the_backend() {
        let backend = StubBackend {
            native_balance: Some("1.75".to_owned()),
            ..StubBackend::default()
        };
        let (status, body) =
            get_json(app(backend), "/api/balance?address=0xabc&chain=sepolia").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["balance"], "1.75");
    }

    #[tokio::test]
    async fn backend_failure_is_a_bounded_502_not_a_hang() {
        let (status, body) =
            get_json(app(StubBackend::default()), "/api/balance?address=0xabc&chain=sepolia")
                .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn token_balance_envelope_matches_wire_contract() {
        let backend = StubBackend {
            usd: Some(TokenUsdBalance {
                balance: "2.0".to_owned(),
                token_price: 2303.0,
                usd_balance: 4606.0,
            }),
            ..StubBackend::default()
        };
        let (status, body) = get_json(
            app(backend),
            "/api/token-balance?address=0xabc&token=ethereum&chain=ethereum&contractAddress=null",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["tokenPrice"], 2303.0);
        assert_eq!(body["usdBalance"], 4606.0);
    }

    #[tokio::test]
    async fn tokens_requires_chain_parameter() {
        let (status, body) = get_json(app(StubBackend::default()), "/api/tokens").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "chain is required");
    }

    #[tokio::test]
    async fn token_transactions_requires_all_three_parameters() {
        let (status, body) = get_json(
            app(StubBackend::default()),
            "/api/token-transactions?address=0xabc&chain=ethereum",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Missing required parameters: address, chain, and token"
        );
    }

    #[test]
    fn legacy_balance_payload_normalizes_to_native_envelope() {
        let normalized = normalized_balance_envelope(legacy("1", json!("420000000000000000")));
        assert_eq!(normalized["success"], true);
        assert_eq!(normalized["balance"], "420000000000000000");

        let failed = normalized_balance_envelope(legacy("0", json!("Invalid API Key")));
        assert_eq!(failed["success"], false);
        assert_eq!(failed["error"], "Invalid API Key");
    }

    #[test]
    fn legacy_transactions_payload_normalizes_with_total_count() {
        let normalized = normalized_transactions_envelope(legacy(
            "1",
            json!([{ "hash": "0x1" }, { "hash": "0x2" }]),
        ));
        assert_eq!(normalized["success"], true);
        assert_eq!(normalized["totalCount"], 2);
        assert_eq!(normalized["transactions"][1]["hash"], "0x2");
    }

    #[test]
    fn native_payload_passes_through_both_normalizers() {
        let native = json!({ "success": true, "balance": "5" });
        let payload = ExplorerPayload::classify(native.clone()).expect("classify");
        assert_eq!(normalized_balance_envelope(payload), native);
    }
}
