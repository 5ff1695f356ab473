//! # AlphaLend tBTC report
//!
//! Reads AlphaLend lending markets from a Sui fullnode and reports on a single
//! coin type (tBTC by default): per-market fields, exact raw-unit totals across
//! the matching markets, and a detailed view of one market with USD metrics.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use alphalend_report::{
//!     AlphalendClient, ReportConfig, ReportGenerator, DETAIL_MARKET_ID, TBTC_COIN_TYPE,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReportConfig::from_env()?;
//! let client = Arc::new(AlphalendClient::from_config(&config)?);
//!
//! let report = ReportGenerator::new(client, TBTC_COIN_TYPE, DETAIL_MARKET_ID);
//! let summary = report.run(&mut std::io::stdout()).await?;
//! println!("matched {} markets", summary.matched_markets);
//! # Ok(())
//! # }
//! ```
//!
//! ## Amounts
//!
//! Market amounts are kept as [`Amount`], the exact text the source reported.
//! Totals only include values that are plain digit strings and are summed as
//! unbounded integers; anything else is printed but left out of the sums. USD
//! figures are `f64` products and meant for display.

pub mod aggregate;
pub mod api;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod providers;
pub mod report;
pub mod rpc;
pub mod telemetry;
pub mod types;
pub mod usd;

// Re-export commonly used types
pub use aggregate::RawUnitTotals;
pub use client::{LendingMarketClient, PriceSource};
pub use config::ReportConfig;
pub use constants::{DETAIL_MARKET_ID, TBTC_COIN_TYPE};
pub use error::{ClientError, ConfigError, ReportError};
pub use providers::{AlphalendClient, CoinGeckoPriceSource};
pub use report::{ReportGenerator, ReportSummary};
pub use types::{Amount, AprBreakdown, MarketData, RewardApr};
pub use usd::UsdMetrics;
