//! Runtime configuration
//!
//! Everything has a compile-time default in [`crate::constants`]. The markets
//! table is found through the mainnet lending protocol object unless the
//! environment points somewhere else.

use crate::{
    constants::{
        ALPHALEND_MAINNET_PROTOCOL_ID, API_DEFAULT_ADDR, REQUEST_TIMEOUT_SECS, SUI_MAINNET_RPC_URL,
    },
    error::ConfigError,
};
use std::time::Duration;

/// Where the protocol's markets live on chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketsLocation {
    /// Object id of the markets table itself
    Table(String),
    /// Object id of the lending protocol; the table id is read from its `markets` field
    Protocol(String),
}

/// Which price source fills market prices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSourceKind {
    CoinGecko,
    Disabled,
}

/// Settings for a report run
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub rpc_url: String,
    pub markets: MarketsLocation,
    pub price_source: PriceSourceKind,
    pub request_timeout: Duration,
    pub api_addr: String,
}

impl ReportConfig {
    /// Reads the configuration from process environment variables
    ///
    /// - `SUI_RPC_URL`
    /// - `ALPHALEND_MARKETS_TABLE_ID` or `ALPHALEND_PROTOCOL_ID` (default: the
    ///   mainnet protocol object)
    /// - `ALPHALEND_PRICE_SOURCE` (`coingecko` or `none`)
    /// - `ALPHALEND_REQUEST_TIMEOUT_SECS`
    /// - `TBTC_API_ADDR`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let markets = match (get("ALPHALEND_MARKETS_TABLE_ID"), get("ALPHALEND_PROTOCOL_ID")) {
            (Some(table), _) => MarketsLocation::Table(table),
            (None, Some(protocol)) => MarketsLocation::Protocol(protocol),
            (None, None) => MarketsLocation::Protocol(ALPHALEND_MAINNET_PROTOCOL_ID.to_string()),
        };

        let price_source = match get("ALPHALEND_PRICE_SOURCE") {
            None => PriceSourceKind::CoinGecko,
            Some(value) => match value.to_lowercase().as_str() {
                "coingecko" => PriceSourceKind::CoinGecko,
                "none" | "off" => PriceSourceKind::Disabled,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "ALPHALEND_PRICE_SOURCE",
                        value,
                    })
                }
            },
        };

        let request_timeout = match get("ALPHALEND_REQUEST_TIMEOUT_SECS") {
            None => Duration::from_secs(REQUEST_TIMEOUT_SECS),
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "ALPHALEND_REQUEST_TIMEOUT_SECS",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            rpc_url: get("SUI_RPC_URL").unwrap_or_else(|| SUI_MAINNET_RPC_URL.to_string()),
            markets,
            price_source,
            request_timeout,
            api_addr: get("TBTC_API_ADDR").unwrap_or_else(|| API_DEFAULT_ADDR.to_string()),
        })
    }
}
