//! USD valuation of a market
//!
//! Display-only: amounts and price are converted to `f64` and multiplied, so
//! results carry ordinary floating point rounding.

use crate::types::{Amount, MarketData};
use serde::Serialize;

/// Dollar figures derived from one market record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdMetrics {
    pub price_usd: f64,
    pub total_supply: f64,
    pub total_borrow: f64,
    pub available_liquidity: f64,
    pub total_supply_usd: f64,
    pub total_borrow_usd: f64,
    pub available_liquidity_usd: f64,
    pub net_liquidity_usd: f64,
}

impl UsdMetrics {
    /// Computes the metrics from a market's price and amounts
    ///
    /// Absent or unparsable values become NaN and propagate into every
    /// product they take part in.
    pub fn from_market(market: &MarketData) -> Self {
        let price_usd = as_f64(market.price.as_ref());
        let total_supply = as_f64(market.total_supply.as_ref());
        let total_borrow = as_f64(market.total_borrow.as_ref());
        let available_liquidity = as_f64(market.available_liquidity.as_ref());

        Self {
            price_usd,
            total_supply,
            total_borrow,
            available_liquidity,
            total_supply_usd: total_supply * price_usd,
            total_borrow_usd: total_borrow * price_usd,
            available_liquidity_usd: available_liquidity * price_usd,
            net_liquidity_usd: (total_supply - total_borrow) * price_usd,
        }
    }
}

fn as_f64(value: Option<&Amount>) -> f64 {
    value.map(Amount::to_f64).unwrap_or(f64::NAN)
}
