//! Client abstractions for market data and prices

use crate::{
    error::ClientError,
    types::{MarketData, PriceQuote},
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of lending market snapshots
///
/// The report only ever needs the two reads below. Implementations decide
/// where the data comes from (a Sui node, a fixture, ...).
#[async_trait]
pub trait LendingMarketClient: Send + Sync {
    /// Fetches every market the protocol knows about
    async fn get_all_markets(&self) -> Result<Vec<MarketData>, ClientError>;

    /// Fetches a single market by its numeric id
    ///
    /// # Returns
    /// The market record, or `ClientError::MarketNotFound` if no such market exists
    async fn get_market_data_from_id(&self, market_id: u64) -> Result<MarketData, ClientError>;

    /// Returns the name of this client
    fn client_name(&self) -> &'static str;
}

/// Source of USD prices keyed by coin type
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the USD price for one coin type
    ///
    /// Returns `Ok(None)` when the source has no listing for the coin type.
    async fn fetch_usd_price(&self, coin_type: &str) -> Result<Option<PriceQuote>, ClientError> {
        let mut prices = self.fetch_usd_prices(&[coin_type]).await?;
        Ok(prices.remove(coin_type))
    }

    /// Fetches USD prices for several coin types in one request
    ///
    /// Coin types the source cannot price are absent from the result.
    async fn fetch_usd_prices(
        &self,
        coin_types: &[&str],
    ) -> Result<HashMap<String, PriceQuote>, ClientError>;

    /// Returns the name of this source
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock market client for testing
    #[derive(Clone)]
    pub struct MockMarketClient {
        markets: Arc<Mutex<Vec<MarketData>>>,
        list_error: Arc<Mutex<Option<String>>>,
        delay: Option<Duration>,
        list_calls: Arc<Mutex<usize>>,
        detail_calls: Arc<Mutex<usize>>,
    }

    impl Default for MockMarketClient {
        fn default() -> Self {
            Self::new(Vec::new())
        }
    }

    impl MockMarketClient {
        pub fn new(markets: Vec<MarketData>) -> Self {
            Self {
                markets: Arc::new(Mutex::new(markets)),
                list_error: Arc::new(Mutex::new(None)),
                delay: None,
                list_calls: Arc::new(Mutex::new(0)),
                detail_calls: Arc::new(Mutex::new(0)),
            }
        }

        /// Makes every call sleep before answering
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn set_list_error(&self, message: &str) {
            *self.list_error.lock().unwrap() = Some(message.to_string());
        }

        pub fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }

        pub fn detail_calls(&self) -> usize {
            *self.detail_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LendingMarketClient for MockMarketClient {
        async fn get_all_markets(&self) -> Result<Vec<MarketData>, ClientError> {
            *self.list_calls.lock().unwrap() += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = self.list_error.lock().unwrap().clone() {
                return Err(ClientError::InvalidResponse(message));
            }
            Ok(self.markets.lock().unwrap().clone())
        }

        async fn get_market_data_from_id(&self, market_id: u64) -> Result<MarketData, ClientError> {
            *self.detail_calls.lock().unwrap() += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.markets
                .lock()
                .unwrap()
                .iter()
                .find(|m| m.market_id == market_id)
                .cloned()
                .ok_or(ClientError::MarketNotFound(market_id))
        }

        fn client_name(&self) -> &'static str {
            "mock"
        }
    }

    /// Mock price source for testing
    #[derive(Default)]
    pub struct MockPriceSource {
        prices: Mutex<HashMap<String, f64>>,
        fail: Mutex<bool>,
        call_count: Mutex<usize>,
    }

    impl MockPriceSource {
        pub fn set_price(&self, coin_type: &str, price_usd: f64) {
            self.prices
                .lock()
                .unwrap()
                .insert(coin_type.to_string(), price_usd);
        }

        pub fn set_failing(&self) {
            *self.fail.lock().unwrap() = true;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl PriceSource for MockPriceSource {
        async fn fetch_usd_prices(
            &self,
            coin_types: &[&str],
        ) -> Result<HashMap<String, PriceQuote>, ClientError> {
            *self.call_count.lock().unwrap() += 1;
            if *self.fail.lock().unwrap() {
                return Err(ClientError::ApiError("HTTP 429".to_string()));
            }
            let prices = self.prices.lock().unwrap();
            Ok(coin_types
                .iter()
                .filter_map(|c| {
                    prices
                        .get(*c)
                        .map(|p| (c.to_string(), PriceQuote::new(*c, *p, "mock")))
                })
                .collect())
        }

        fn source_name(&self) -> &'static str {
            "mock"
        }
    }
}
