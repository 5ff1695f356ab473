//! The tBTC market report
//!
//! A run has two independent halves that always execute in this order:
//!
//! 1. list every market, keep the ones whose coin type matches, print each and
//!    sum their raw amounts;
//! 2. fetch the fixed detail market by id, print its expanded view, the full
//!    JSON record and its USD metrics.
//!
//! The detail half does not depend on the filter result. When nothing matches
//! the run stops after reporting so.

use crate::{
    aggregate::{common_decimals, filter_by_coin_type, to_human_units, RawUnitTotals},
    client::LendingMarketClient,
    error::ReportError,
    types::{Amount, AprBreakdown, MarketData, RewardApr},
    usd::UsdMetrics,
};
use std::io::Write;
use std::sync::Arc;

/// What a full report run produced
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub matched_markets: usize,
    pub totals: RawUnitTotals,
    pub detail: Option<MarketData>,
    pub usd: Option<UsdMetrics>,
}

/// Prints market statistics for one coin type
pub struct ReportGenerator {
    client: Arc<dyn LendingMarketClient>,
    coin_type: String,
    detail_market_id: u64,
}

impl ReportGenerator {
    pub fn new(
        client: Arc<dyn LendingMarketClient>,
        coin_type: impl Into<String>,
        detail_market_id: u64,
    ) -> Self {
        Self {
            client,
            coin_type: coin_type.into(),
            detail_market_id,
        }
    }

    /// Short label for headings, e.g. `TBTC` for `0x…::TBTC::TBTC`
    pub fn symbol(&self) -> &str {
        coin_symbol(&self.coin_type)
    }

    /// Runs the full report, writing it to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<ReportSummary, ReportError> {
        let symbol = self.symbol().to_string();

        writeln!(out, "Fetching AlphaLend markets ...")?;
        let markets = self.client.get_all_markets().await?;
        let matches = filter_by_coin_type(&markets, &self.coin_type);
        tracing::info!(
            client = self.client.client_name(),
            total = markets.len(),
            matched = matches.len(),
            coin_type = %self.coin_type,
            "Filtered markets"
        );

        if matches.is_empty() {
            writeln!(out, "No markets found for {} coin type on AlphaLend.", symbol)?;
            writeln!(out, "Checked coin type: {}", self.coin_type)?;
            return Ok(ReportSummary {
                matched_markets: 0,
                totals: RawUnitTotals::default(),
                detail: None,
                usd: None,
            });
        }

        let mut totals = RawUnitTotals::default();
        for market in &matches {
            write_market(out, &symbol, market)?;
            totals.add_market(market);
        }
        write_totals(out, &symbol, &totals, common_decimals(&matches))?;

        let detail = self.client.get_market_data_from_id(self.detail_market_id).await?;
        write_detail(out, &symbol, &detail)?;

        writeln!(out, "\n=== Full Market {} JSON ===", detail.market_id)?;
        writeln!(out, "{}", serde_json::to_string_pretty(&detail)?)?;

        let usd = UsdMetrics::from_market(&detail);
        write_usd(out, &symbol, detail.market_id, &usd)?;

        Ok(ReportSummary {
            matched_markets: matches.len(),
            totals,
            detail: Some(detail),
            usd: Some(usd),
        })
    }

    /// Fetches only the detail market and writes it as one line of compact JSON
    pub async fn run_json<W: Write>(&self, out: &mut W) -> Result<MarketData, ReportError> {
        let detail = self.client.get_market_data_from_id(self.detail_market_id).await?;
        writeln!(out, "{}", serde_json::to_string(&detail)?)?;
        Ok(detail)
    }
}

/// Last path segment of a coin type
pub fn coin_symbol(coin_type: &str) -> &str {
    coin_type.rsplit("::").next().unwrap_or(coin_type)
}

fn show(value: Option<&Amount>) -> String {
    value.map_or_else(|| "undefined".to_string(), Amount::to_string)
}

fn show_interest(apr: Option<&AprBreakdown>) -> String {
    show(apr.and_then(|a| a.interest_apr.as_ref()))
}

/// Renders reward entries in order as `[{ coinType: …, rewardApr: … }, …]`
pub fn format_rewards(rewards: &[RewardApr]) -> String {
    let entries: Vec<String> = rewards
        .iter()
        .map(|r| format!("{{ coinType: {}, rewardApr: {} }}", r.coin_type, r.reward_apr))
        .collect();
    format!("[{}]", entries.join(", "))
}

fn show_rewards(apr: Option<&AprBreakdown>) -> String {
    format_rewards(apr.map(|a| a.rewards.as_slice()).unwrap_or_default())
}

fn show_decimals(market: &MarketData) -> String {
    market
        .decimal_digit
        .map_or_else(|| "undefined".to_string(), |d| d.to_string())
}

fn write_market<W: Write>(out: &mut W, symbol: &str, m: &MarketData) -> std::io::Result<()> {
    writeln!(out, "--- {} Market ---", symbol)?;
    writeln!(out, "marketId: {}", m.market_id)?;
    writeln!(out, "coinType: {}", m.coin_type)?;
    writeln!(out, "decimals: {}", show_decimals(m))?;
    writeln!(out, "price (USD): {}", show(m.price.as_ref()))?;
    writeln!(out, "totalSupply: {}", show(m.total_supply.as_ref()))?;
    writeln!(out, "totalBorrow: {}", show(m.total_borrow.as_ref()))?;
    writeln!(out, "availableLiquidity: {}", show(m.available_liquidity.as_ref()))?;
    writeln!(out, "supplyApr (interest): {}", show_interest(m.supply_apr.as_ref()))?;
    writeln!(out, "supplyApr (rewards): {}", show_rewards(m.supply_apr.as_ref()))?;
    Ok(())
}

fn write_totals<W: Write>(
    out: &mut W,
    symbol: &str,
    totals: &RawUnitTotals,
    decimals: Option<u32>,
) -> std::io::Result<()> {
    writeln!(out, "\n=== Aggregated {} Totals on AlphaLend ===", symbol)?;
    writeln!(out, "Total Supply (raw units): {}", totals.total_supply)?;
    writeln!(out, "Total Borrow (raw units): {}", totals.total_borrow)?;
    writeln!(out, "Available Liquidity (raw units): {}", totals.available_liquidity)?;

    writeln!(out, "\nTip: Divide raw units by 10^decimals to get human units.")?;
    if let Some(decimals) = decimals {
        let rows = [
            ("Total Supply", &totals.total_supply),
            ("Total Borrow", &totals.total_borrow),
            ("Available Liquidity", &totals.available_liquidity),
        ];
        for (label, raw) in rows {
            if let Some(human) = to_human_units(raw, decimals) {
                writeln!(out, "{} ({}): {}", label, symbol, human)?;
            }
        }
    }
    Ok(())
}

fn write_detail<W: Write>(out: &mut W, symbol: &str, m: &MarketData) -> std::io::Result<()> {
    writeln!(out, "\n=== Market {} Detailed Data ({}) ===", m.market_id, symbol)?;
    writeln!(out, "marketId: {}", m.market_id)?;
    writeln!(out, "coinType: {}", m.coin_type)?;
    writeln!(out, "decimals: {}", show_decimals(m))?;
    writeln!(out, "price (USD): {}", show(m.price.as_ref()))?;
    writeln!(out, "ltv: {}", show(m.ltv.as_ref()))?;
    writeln!(out, "liquidationThreshold: {}", show(m.liquidation_threshold.as_ref()))?;
    writeln!(out, "totalSupply: {}", show(m.total_supply.as_ref()))?;
    writeln!(out, "totalBorrow: {}", show(m.total_borrow.as_ref()))?;
    writeln!(out, "availableLiquidity: {}", show(m.available_liquidity.as_ref()))?;
    writeln!(out, "borrowFee: {}", show(m.borrow_fee.as_ref()))?;
    writeln!(out, "xtokenRatio: {}", show(m.xtoken_ratio.as_ref()))?;
    writeln!(out, "supplyApr (interest): {}", show_interest(m.supply_apr.as_ref()))?;
    writeln!(out, "supplyApr (rewards): {}", show_rewards(m.supply_apr.as_ref()))?;
    writeln!(out, "borrowApr (interest): {}", show_interest(m.borrow_apr.as_ref()))?;
    Ok(())
}

fn write_usd<W: Write>(
    out: &mut W,
    symbol: &str,
    market_id: u64,
    usd: &UsdMetrics,
) -> std::io::Result<()> {
    writeln!(out, "\n=== {} USD Metrics (Market {}, raw units) ===", symbol, market_id)?;
    writeln!(out, "priceUsd: {}", usd.price_usd)?;
    writeln!(out, "totalSupply ({}): {}", symbol, usd.total_supply)?;
    writeln!(out, "totalBorrow ({}): {}", symbol, usd.total_borrow)?;
    writeln!(out, "availableLiquidity ({}): {}", symbol, usd.available_liquidity)?;
    writeln!(out, "totalSupplyUsd: {}", usd.total_supply_usd)?;
    writeln!(out, "totalBorrowUsd: {}", usd.total_borrow_usd)?;
    writeln!(out, "availableLiquidityUsd: {}", usd.available_liquidity_usd)?;
    writeln!(out, "netLiquidityUsd (supply - borrow): {}", usd.net_liquidity_usd)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockMarketClient;
    use crate::error::ClientError;
    use serde_json::json;

    const TBTC: &str = "0x77045f1b9f811a7a8fb9ebd085b5b0c55c5cb0d1520ff55f7037f89b5da9f5f1::TBTC::TBTC";

    fn tbtc_market(id: u64, supply: &str, borrow: &str, available: &str) -> MarketData {
        let mut m = MarketData::new(id, TBTC);
        m.decimal_digit = Some(8);
        m.price = Some(Amount::new("2.5"));
        m.total_supply = Some(Amount::new(supply));
        m.total_borrow = Some(Amount::new(borrow));
        m.available_liquidity = Some(Amount::new(available));
        m
    }

    fn generator(client: &MockMarketClient) -> ReportGenerator {
        ReportGenerator::new(Arc::new(client.clone()), TBTC, 14)
    }

    #[test]
    fn test_coin_symbol() {
        assert_eq!(coin_symbol(TBTC), "TBTC");
        assert_eq!(coin_symbol("SUI"), "SUI");
    }

    #[test]
    fn test_format_rewards_keeps_order() {
        let rewards = vec![
            RewardApr { coin_type: "0x2::sui::SUI".to_string(), reward_apr: Amount::new("0.05") },
            RewardApr { coin_type: "0xa::alpha::ALPHA".to_string(), reward_apr: Amount::new("0.012") },
        ];
        assert_eq!(
            format_rewards(&rewards),
            "[{ coinType: 0x2::sui::SUI, rewardApr: 0.05 }, { coinType: 0xa::alpha::ALPHA, rewardApr: 0.012 }]"
        );
        assert_eq!(format_rewards(&[]), "[]");
    }

    #[tokio::test]
    async fn test_full_report() {
        let mut detail = tbtc_market(14, "4", "1", "3");
        detail.supply_apr = Some(AprBreakdown {
            interest_apr: Some(Amount::new("0.021")),
            rewards: vec![RewardApr {
                coin_type: "0x2::sui::SUI".to_string(),
                reward_apr: Amount::new("0.004"),
            }],
        });
        let client = MockMarketClient::new(vec![
            MarketData::new(1, "0x2::sui::SUI"),
            detail,
            tbtc_market(20, "9999999999999999999", "12.5", "7"),
        ]);

        let mut out = Vec::new();
        let summary = generator(&client).run(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(client.list_calls(), 1);
        assert_eq!(client.detail_calls(), 1);
        assert_eq!(summary.matched_markets, 2);
        assert_eq!(summary.totals.total_supply.to_string(), "10000000000000000003");
        assert_eq!(summary.totals.total_borrow.to_string(), "1");
        assert_eq!(summary.totals.available_liquidity.to_string(), "10");

        assert_eq!(text.matches("--- TBTC Market ---").count(), 2);
        assert!(text.contains("totalBorrow: 12.5\n"));
        assert!(text.contains("Total Supply (raw units): 10000000000000000003\n"));
        assert!(text.contains("Available Liquidity (TBTC): 0.0000001\n"));
        assert!(text.contains("supplyApr (interest): 0.021\n"));
        assert!(text.contains("supplyApr (rewards): [{ coinType: 0x2::sui::SUI, rewardApr: 0.004 }]\n"));
        assert!(text.contains("=== Market 14 Detailed Data (TBTC) ==="));
        assert!(text.contains("borrowApr (interest): undefined\n"));
        assert!(text.contains("=== Full Market 14 JSON ===\n{\n"));
        assert!(text.contains("=== TBTC USD Metrics (Market 14, raw units) ===\n"));
        assert!(text.contains("totalSupplyUsd: 10\n"));
        assert!(text.contains("netLiquidityUsd (supply - borrow): 7.5\n"));

        let usd = summary.usd.unwrap();
        assert_eq!(usd.total_supply_usd, 10.0);
    }

    #[tokio::test]
    async fn test_no_match_reports_and_succeeds() {
        let client = MockMarketClient::new(vec![MarketData::new(1, "0x2::sui::SUI")]);

        let mut out = Vec::new();
        let summary = generator(&client).run(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.matched_markets, 0);
        assert_eq!(summary.totals, RawUnitTotals::default());
        assert!(summary.detail.is_none());
        assert!(text.contains("No markets found for TBTC coin type on AlphaLend."));
        assert!(text.contains(&format!("Checked coin type: {}", TBTC)));
        assert_eq!(client.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_detail_is_fetched_by_id_regardless_of_filter() {
        // market 14 is listed under another coin type; it is still shown in detail
        let client = MockMarketClient::new(vec![
            tbtc_market(3, "10", "0", "10"),
            MarketData::new(14, "0x2::sui::SUI"),
        ]);

        let mut out = Vec::new();
        let summary = generator(&client).run(&mut out).await.unwrap();

        assert_eq!(summary.matched_markets, 1);
        assert_eq!(summary.detail.unwrap().coin_type, "0x2::sui::SUI");
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("priceUsd: NaN\n"));
    }

    #[tokio::test]
    async fn test_json_mode_fetches_only_detail() {
        let mut detail = tbtc_market(14, "4", "1", "3");
        detail.extra.insert("borrowWeight2".to_string(), json!("1.5"));
        let client = MockMarketClient::new(vec![detail.clone()]);

        let mut out = Vec::new();
        generator(&client).run_json(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(client.list_calls(), 0);
        assert_eq!(client.detail_calls(), 1);
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));

        let parsed: MarketData = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed, detail);
        assert_eq!(text.trim_end(), serde_json::to_string(&detail).unwrap());
    }

    #[tokio::test]
    async fn test_list_failure_is_fatal() {
        let client = MockMarketClient::new(vec![tbtc_market(14, "4", "1", "3")]);
        client.set_list_error("connection reset");

        let mut out = Vec::new();
        let err = generator(&client).run(&mut out).await.unwrap_err();
        assert!(matches!(err, ReportError::Client(ClientError::InvalidResponse(_))));
        assert_eq!(client.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_detail_market_is_fatal_after_totals() {
        let client = MockMarketClient::new(vec![tbtc_market(3, "10", "0", "10")]);

        let mut out = Vec::new();
        let err = generator(&client).run(&mut out).await.unwrap_err();
        assert!(matches!(err, ReportError::Client(ClientError::MarketNotFound(14))));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total Supply (raw units): 10\n"));
    }
}
