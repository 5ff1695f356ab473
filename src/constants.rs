//! Constants for the AlphaLend report
//!
//! Compile-time defaults live here. The few values that differ between
//! deployments (RPC endpoint, protocol object ids) can be overridden through
//! the environment, see [`crate::config::ReportConfig::from_env`].

/// Coin type of tBTC on Sui mainnet
pub const TBTC_COIN_TYPE: &str =
    "0x77045f1b9f811a7a8fb9ebd085b5b0c55c5cb0d1520ff55f7037f89b5da9f5f1::TBTC::TBTC";

/// AlphaLend lending protocol object on Sui mainnet, as published in the
/// AlphaLend SDK's mainnet constants
pub const ALPHALEND_MAINNET_PROTOCOL_ID: &str =
    "0x01d9cf05d65fa3a9bb7163095139120e3c4e414dfbab153a49779a7d14010b93";

/// Market id of the tBTC market on AlphaLend, always shown in detail
pub const DETAIL_MARKET_ID: u64 = 14;

/// Default Sui fullnode JSON-RPC endpoint
pub const SUI_MAINNET_RPC_URL: &str = "https://rpc.mainnet.sui.io";

/// HTTP request timeout for RPC and price calls (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size for `suix_getDynamicFields`
pub const DYNAMIC_FIELDS_PAGE_SIZE: usize = 50;

/// Maximum object ids per `sui_multiGetObjects` call
pub const MULTI_GET_OBJECTS_CHUNK: usize = 50;

/// AlphaLend stores ratios and prices as fixed point numbers with 18 decimals
pub const FIXED_POINT_DECIMALS: u32 = 18;

/// Basis points in one unit
pub const BPS_DECIMALS: u32 = 4;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko ids for coin types the report knows how to price
pub const COINGECKO_IDS: &[(&str, &str)] = &[(TBTC_COIN_TYPE, "tbtc")];

/// How long the HTTP API waits for the detail fetch (in seconds)
pub const API_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default bind address of the HTTP API
pub const API_DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "alphalend-report/0.1.0";
