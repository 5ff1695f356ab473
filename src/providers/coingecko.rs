//! CoinGecko price source

use crate::{
    client::PriceSource,
    constants::{
        COINGECKO_API_URL, COINGECKO_IDS, COINGECKO_SIMPLE_PRICE_ENDPOINT, REQUEST_TIMEOUT_SECS,
        USER_AGENT,
    },
    error::ClientError,
    types::PriceQuote,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct CoinGeckoResponse {
    #[serde(flatten)]
    prices: HashMap<String, CoinGeckoPriceData>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoPriceData {
    usd: f64,
}

/// CoinGecko price source
///
/// Coin types are mapped to CoinGecko ids through a fixed table; coin types
/// without an id are never requested.
pub struct CoinGeckoPriceSource {
    client: Client,
    base_url: String,
    ids: HashMap<String, String>,
}

impl CoinGeckoPriceSource {
    /// Creates a source with the built-in coin type table
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::NetworkError)?;

        Ok(Self::with_client(client))
    }

    /// Creates a source sharing an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        let ids = COINGECKO_IDS
            .iter()
            .map(|(coin_type, id)| (coin_type.to_string(), id.to_string()))
            .collect();

        Self {
            client,
            base_url: COINGECKO_API_URL.to_string(),
            ids,
        }
    }

    /// CoinGecko id for a coin type, if one is known
    pub fn coingecko_id(&self, coin_type: &str) -> Option<&str> {
        self.ids.get(coin_type).map(String::as_str)
    }

    /// Builds the CoinGecko API URL for fetching prices
    fn build_url(&self, ids: &[&str]) -> String {
        format!(
            "{}{}?ids={}&vs_currencies=usd",
            self.base_url,
            COINGECKO_SIMPLE_PRICE_ENDPOINT,
            ids.join(",")
        )
    }

    /// Parses the CoinGecko response into quotes keyed by coin type
    fn parse_response(
        &self,
        response: CoinGeckoResponse,
        coin_types: &[&str],
    ) -> HashMap<String, PriceQuote> {
        let mut result = HashMap::new();

        for coin_type in coin_types {
            let Some(id) = self.coingecko_id(coin_type) else {
                continue;
            };
            if let Some(price_data) = response.prices.get(id) {
                result.insert(
                    coin_type.to_string(),
                    PriceQuote::new(*coin_type, price_data.usd, self.source_name()),
                );
            }
        }

        result
    }
}

#[async_trait]
impl PriceSource for CoinGeckoPriceSource {
    async fn fetch_usd_prices(
        &self,
        coin_types: &[&str],
    ) -> Result<HashMap<String, PriceQuote>, ClientError> {
        let mut ids: Vec<&str> = coin_types
            .iter()
            .filter_map(|c| self.coingecko_id(c))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.build_url(&ids);
        tracing::debug!(url = %url, "Fetching prices from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::NetworkError)?;

        if !response.status().is_success() {
            return Err(ClientError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ClientError::NetworkError)?;

        let coingecko_response: CoinGeckoResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                ClientError::invalid_response(format!(
                    "Failed to parse CoinGecko response: {}. Response: {}",
                    e, response_text
                ))
            })?;

        let prices = self.parse_response(coingecko_response, coin_types);
        tracing::debug!(count = prices.len(), "Fetched prices from CoinGecko");

        Ok(prices)
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }
}
