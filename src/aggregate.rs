//! Coin type filtering and raw unit aggregation

use num_bigint::BigUint;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::{Amount, MarketData};

/// Parses a plain non-negative integer literal
///
/// Only strings made of one or more ASCII digits qualify. Signs, decimal
/// points, exponents and whitespace all disqualify the value.
pub fn parse_raw_units(value: &str) -> Option<BigUint> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(value.as_bytes(), 10)
}

/// Selects the markets whose coin type equals `coin_type` exactly
pub fn filter_by_coin_type<'a>(markets: &'a [MarketData], coin_type: &str) -> Vec<&'a MarketData> {
    markets.iter().filter(|m| m.coin_type == coin_type).collect()
}

/// Converts raw units into human units given the coin's decimals
///
/// Returns `None` when the value does not fit a `Decimal`.
pub fn to_human_units(raw: &BigUint, decimals: u32) -> Option<Decimal> {
    let mut value = Decimal::from_str(&raw.to_string()).ok()?;
    value.set_scale(decimals).ok()?;
    Some(value.normalize())
}

/// Exact sums of supply, borrow and available liquidity in raw units
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUnitTotals {
    pub total_supply: BigUint,
    pub total_borrow: BigUint,
    pub available_liquidity: BigUint,
}

impl RawUnitTotals {
    /// Sums the given markets
    pub fn from_markets<'a>(markets: impl IntoIterator<Item = &'a MarketData>) -> Self {
        let mut totals = Self::default();
        for market in markets {
            totals.add_market(market);
        }
        totals
    }

    /// Adds one market's amounts
    ///
    /// Each field is checked on its own: a value that is absent or not an
    /// integer literal is left out of its sum without affecting the others.
    pub fn add_market(&mut self, market: &MarketData) {
        accumulate(&mut self.total_supply, market.total_supply.as_ref());
        accumulate(&mut self.total_borrow, market.total_borrow.as_ref());
        accumulate(&mut self.available_liquidity, market.available_liquidity.as_ref());
    }
}

fn accumulate(sum: &mut BigUint, value: Option<&Amount>) {
    match value.and_then(Amount::raw_units) {
        Some(units) => *sum += units,
        None => tracing::debug!(
            value = value.map(Amount::as_str).unwrap_or("undefined"),
            "Skipping non-integer amount"
        ),
    }
}

/// Decimals shared by every market, if they agree
pub fn common_decimals(markets: &[&MarketData]) -> Option<u32> {
    let first = markets.first()?.decimal_digit?;
    markets
        .iter()
        .all(|m| m.decimal_digit == Some(first))
        .then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TBTC: &str = "0xabc::TBTC::TBTC";

    fn market(id: u64, coin_type: &str, supply: &str, borrow: &str, available: &str) -> MarketData {
        let mut m = MarketData::new(id, coin_type);
        m.total_supply = Some(Amount::new(supply));
        m.total_borrow = Some(Amount::new(borrow));
        m.available_liquidity = Some(Amount::new(available));
        m
    }

    #[test]
    fn test_raw_units_pattern() {
        assert_eq!(parse_raw_units("1000"), Some(BigUint::from(1000u32)));
        assert_eq!(parse_raw_units("0"), Some(BigUint::from(0u32)));
        assert_eq!(parse_raw_units("007"), Some(BigUint::from(7u32)));

        for rejected in ["12.5", "-5", "", "1e10", " 1", "1 ", "+1", "0x10", "١٢"] {
            assert!(parse_raw_units(rejected).is_none(), "{rejected:?} should not parse");
        }
    }

    #[test]
    fn test_filter_is_exact_and_case_sensitive() {
        let markets = vec![
            market(1, TBTC, "1", "0", "1"),
            market(2, "0xABC::TBTC::TBTC", "1", "0", "1"),
            market(3, "0x2::sui::SUI", "1", "0", "1"),
            market(4, TBTC, "2", "0", "2"),
        ];

        let ids: Vec<u64> = filter_by_coin_type(&markets, TBTC)
            .iter()
            .map(|m| m.market_id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_no_match_gives_zero_totals() {
        let markets = vec![market(3, "0x2::sui::SUI", "5", "1", "4")];
        let matches = filter_by_coin_type(&markets, TBTC);
        assert!(matches.is_empty());

        let totals = RawUnitTotals::from_markets(matches);
        assert_eq!(totals, RawUnitTotals::default());
        assert_eq!(totals.total_supply.to_string(), "0");
    }

    #[test]
    fn test_sums_do_not_lose_precision() {
        let markets = vec![
            market(1, TBTC, "9999999999999999999", "18446744073709551615", "1"),
            market(2, TBTC, "1", "18446744073709551615", "2"),
        ];

        let totals = RawUnitTotals::from_markets(&markets);
        assert_eq!(totals.total_supply.to_string(), "10000000000000000000");
        assert_eq!(totals.total_borrow.to_string(), "36893488147419103230");
        assert_eq!(totals.available_liquidity.to_string(), "3");
    }

    #[test]
    fn test_bad_fields_are_skipped_individually() {
        let mut partial = market(2, TBTC, "12.5", "40", "-5");
        partial.available_liquidity = None;
        let markets = vec![market(1, TBTC, "100", "10", "90"), partial];

        let totals = RawUnitTotals::from_markets(&markets);
        assert_eq!(totals.total_supply, BigUint::from(100u32));
        assert_eq!(totals.total_borrow, BigUint::from(50u32));
        assert_eq!(totals.available_liquidity, BigUint::from(90u32));
    }

    #[test]
    fn test_human_units() {
        let raw = BigUint::from(150_000_000u64);
        assert_eq!(to_human_units(&raw, 8), Some(Decimal::new(15, 1)));
        assert_eq!(to_human_units(&raw, 0), Some(Decimal::from(150_000_000u64)));
        assert!(to_human_units(&raw, 40).is_none());

        let huge = BigUint::parse_bytes(b"1000000000000000000000000000000000", 10).unwrap();
        assert!(to_human_units(&huge, 8).is_none());
    }

    #[test]
    fn test_common_decimals() {
        let mut a = market(1, TBTC, "1", "0", "1");
        let mut b = market(2, TBTC, "1", "0", "1");
        a.decimal_digit = Some(8);
        b.decimal_digit = Some(8);
        assert_eq!(common_decimals(&[&a, &b]), Some(8));

        b.decimal_digit = Some(6);
        assert_eq!(common_decimals(&[&a, &b]), None);
        assert_eq!(common_decimals(&[]), None);
    }
}
