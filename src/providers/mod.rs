//! Price source implementations

pub mod coingecko;

pub use coingecko::CoinGeckoProvider;
