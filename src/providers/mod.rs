//! Market data and price client implementations

pub mod alphalend;
pub mod coingecko;

pub use alphalend::AlphalendClient;
pub use coingecko::CoinGeckoPriceSource;
