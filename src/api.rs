//! HTTP API exposing the detail market record
//!
//! `GET /tbtc` answers with the same record the CLI prints under `--json`.

use crate::{
    client::LendingMarketClient,
    constants::{API_FETCH_TIMEOUT_SECS, DETAIL_MARKET_ID},
    error::ClientError,
    types::MarketData,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Shared state of the API handlers
#[derive(Clone)]
pub struct ApiState {
    client: Arc<dyn LendingMarketClient>,
    market_id: u64,
    timeout: Duration,
}

impl ApiState {
    pub fn new(client: Arc<dyn LendingMarketClient>) -> Self {
        Self {
            client,
            market_id: DETAIL_MARKET_ID,
            timeout: Duration::from_secs(API_FETCH_TIMEOUT_SECS),
        }
    }

    /// Overrides how long a fetch may take before the API gives up
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error answered as `{"detail": …}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn timeout(after: Duration) -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            detail: format!("Timeout fetching market data after {:?}", after),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let status = match err {
            ClientError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: format!("Market fetch failed: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/tbtc", get(get_tbtc_market))
        .with_state(state)
}

async fn get_tbtc_market(State(state): State<ApiState>) -> Result<Json<MarketData>, ApiError> {
    let fetch = state.client.get_market_data_from_id(state.market_id);
    match tokio::time::timeout(state.timeout, fetch).await {
        Ok(Ok(market)) => {
            tracing::info!(market_id = market.market_id, "Served market record");
            Ok(Json(market))
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Error fetching market record");
            Err(e.into())
        }
        Err(_) => {
            tracing::error!(timeout = ?state.timeout, "Market fetch timed out");
            Err(ApiError::timeout(state.timeout))
        }
    }
}
