//! Price source trait and fetch errors

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use super::CoinId;

/// Prices in USD keyed by coin. Coins the service did not recognize are absent.
pub type PriceQuote = HashMap<CoinId, f64>;

/// Errors that can occur while fetching prices
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Quote service returned HTTP {0}")]
    Status(u16),

    #[error("Rate limited by quote service, try again later")]
    RateLimited,

    #[error("Failed to parse quote response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// A remote service that can quote USD prices for a set of coins.
///
/// Implementations perform exactly one outbound request per call and never
/// retry or cache; the refresh scheduler decides when to ask again.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch the current price of every coin in `coins`
    async fn fetch(&self, coins: &[CoinId]) -> Result<PriceQuote, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(FetchError::Status(503).to_string().contains("503"));
        assert!(FetchError::Timeout.to_string().contains("timed out"));
        let err = FetchError::Network("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
