//! Types for the AlphaLend report

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::aggregate::parse_raw_units;

/// A decimal-like value exactly as the source reported it
///
/// Market amounts arrive as decimal strings (sometimes as JSON numbers). The
/// textual form is kept so that printing reproduces the source, and each
/// consumer picks the interpretation it needs: exact raw units, a `Decimal`,
/// or a display-only `f64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Amount(String);

impl Amount {
    /// Wraps a textual value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds an amount from a float, using the shortest round-trip form
    pub fn from_f64(value: f64) -> Self {
        Self(value.to_string())
    }

    /// Converts an on-chain fixed point integer into its decimal form
    ///
    /// `raw` must be a digit string; `decimals` is the number of implied
    /// fractional digits. Trailing zeros are trimmed, so
    /// `("600000000000000000", 18)` becomes `0.6`.
    pub fn from_fixed_point(raw: &str, decimals: u32) -> Option<Self> {
        parse_raw_units(raw)?;

        let digits = raw.trim_start_matches('0');
        let decimals = decimals as usize;
        if digits.is_empty() {
            return Some(Self::new("0"));
        }

        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
        } else {
            digits.to_string()
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
        let frac_part = frac_part.trim_end_matches('0');

        if frac_part.is_empty() {
            Some(Self::new(int_part))
        } else {
            Some(Self::new(format!("{}.{}", int_part, frac_part)))
        }
    }

    /// The value as reported
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact raw units, only when the value is a plain digit string
    pub fn raw_units(&self) -> Option<BigUint> {
        parse_raw_units(&self.0)
    }

    /// The value as a `Decimal`, when it fits
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(self.0.trim())
            .or_else(|_| Decimal::from_scientific(self.0.trim()))
            .ok()
    }

    /// Lossy float conversion; unparsable values become NaN
    pub fn to_f64(&self) -> f64 {
        self.0.trim().parse::<f64>().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value.to_string())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value.normalize().to_string())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                Ok(Amount::new(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                Ok(Amount(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                Ok(Amount::from_f64(v))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Market ids show up both as JSON numbers and as strings
mod market_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// One incentive entry of an APR breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardApr {
    /// Coin type the reward is paid in
    pub coin_type: String,
    /// Annualized reward rate
    pub reward_apr: Amount,
}

/// Base interest plus incentive rewards
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_apr: Option<Amount>,
    #[serde(default)]
    pub rewards: Vec<RewardApr>,
}

/// Snapshot of one AlphaLend market
///
/// Field names follow the camelCase JSON the protocol tooling emits. Keys the
/// report does not know about are kept in `extra` so the JSON dump stays
/// complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(with = "market_id")]
    pub market_id: u64,
    pub coin_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_digit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_borrow: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_liquidity: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization_rate: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltv: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidation_threshold: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_fee: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_weight: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xtoken_ratio: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_deposit_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_borrow_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_apr: Option<AprBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_apr: Option<AprBreakdown>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MarketData {
    /// Creates a record with only identity fields set
    pub fn new(market_id: u64, coin_type: impl Into<String>) -> Self {
        Self {
            market_id,
            coin_type: coin_type.into(),
            decimal_digit: None,
            price: None,
            total_supply: None,
            total_borrow: None,
            available_liquidity: None,
            utilization_rate: None,
            ltv: None,
            liquidation_threshold: None,
            borrow_fee: None,
            borrow_weight: None,
            xtoken_ratio: None,
            allowed_deposit_amount: None,
            allowed_borrow_amount: None,
            supply_apr: None,
            borrow_apr: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// USD price of a coin type from a price source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Coin type the price applies to
    pub coin_type: String,

    /// Price in USD
    pub price_usd: f64,

    /// When the quote was taken
    pub last_updated: DateTime<Utc>,

    /// Data source
    pub source: String,
}

impl PriceQuote {
    /// Create a new quote stamped with the current time
    pub fn new(coin_type: impl Into<String>, price_usd: f64, source: impl Into<String>) -> Self {
        Self {
            coin_type: coin_type.into(),
            price_usd,
            last_updated: Utc::now(),
            source: source.into(),
        }
    }
}
