//! Same-origin proxy for the wallet UI.
//!
//! Mirrors the backend's wallet endpoints under `/api/*` and normalizes the
//! legacy block-explorer response shape into the native `{ success, ... }`
//! envelope so old clients keep working against one contract.

mod explorer;
mod routes;

use axum::{Json, Router, http::StatusCode, routing::get};
use nw_backend_client::{HttpWalletBackend, WalletBackend};
use nw_storage::InMemoryStore;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use explorer::ExplorerClient;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) success: bool,
    pub(crate) error: String,
}

pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) backend: Arc<dyn WalletBackend>,
    pub(crate) explorer: Arc<ExplorerClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let backend_url =
        std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:4444".to_owned());
    // The proxy holds no session; wallet routes it mirrors are public reads.
    let sessions = Arc::new(InMemoryStore::default());
    let backend = Arc::new(HttpWalletBackend::new(backend_url, sessions)?);
    let explorer = Arc::new(ExplorerClient::from_env()?);

    let state = AppState { backend, explorer };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    info!("wallet-proxy listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/balance", get(routes::balance))
        .route("/api/balances", get(routes::balances))
        .route("/api/token-balance", get(routes::token_balance))
        .route("/api/tokens", get(routes::tokens))
        .route("/api/transactions", get(routes::transactions))
        .route("/api/token-transactions", get(routes::token_transactions))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            error: message.to_owned(),
        }),
    )
}

pub(crate) fn bad_gateway(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            success: false,
            error: message.to_owned(),
        }),
    )
}
