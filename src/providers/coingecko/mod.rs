//! CoinGecko price source
//!
//! Fetches spot prices from the public `simple/price` endpoint.
//! No API key is required for the public tier.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{join_ids, CoinId, FetchError, PriceQuote, PriceSource};
use crate::settings::Settings;

/// CoinGecko API base URL
pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Quote currency requested from the service
const VS_CURRENCY: &str = "usd";

/// CoinGecko price source
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinbar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::new(settings.api_base_url.clone(), settings.request_timeout())
    }

    fn price_url(&self) -> String {
        format!("{}/simple/price", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch(&self, coins: &[CoinId]) -> Result<PriceQuote, FetchError> {
        if coins.is_empty() {
            return Ok(PriceQuote::new());
        }

        let ids = join_ids(coins);
        tracing::debug!("Fetching CoinGecko prices for {}", ids);

        let resp = self
            .client
            .get(self.price_url())
            .query(&[("ids", ids.as_str()), ("vs_currencies", VS_CURRENCY)])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let entries: HashMap<String, serde_json::Value> = resp.json().await?;
        let prices = collect_prices(entries);

        tracing::debug!("CoinGecko returned {} of {} prices", prices.len(), coins.len());
        Ok(prices)
    }
}

/// Pull the USD price out of each `simple/price` entry such as
/// `{"bitcoin":{"usd":65000.5}}`.
///
/// Entries without a numeric `usd` field are left out rather than failing
/// the whole quote.
fn collect_prices(entries: HashMap<String, serde_json::Value>) -> PriceQuote {
    entries
        .into_iter()
        .filter_map(|(id, entry)| {
            let price = entry.get(VS_CURRENCY).and_then(|v| v.as_f64());
            if price.is_none() {
                tracing::debug!("No {} price for {} in response", VS_CURRENCY, id);
            }
            price.map(|p| (CoinId::from(id), p))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a random local port.
    /// The join handle yields the raw request that was received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api/v3", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (base, handle)
    }

    fn coins(ids: &[&str]) -> Vec<CoinId> {
        ids.iter().map(|id| CoinId::from(*id)).collect()
    }

    fn entries(body: &str) -> HashMap<String, serde_json::Value> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_collect_prices() {
        let prices = collect_prices(entries(r#"{"bitcoin":{"usd":65000.5},"ethereum":{"usd":3100}}"#));
        assert_eq!(prices.get(&CoinId::from("bitcoin")), Some(&65000.5));
        assert_eq!(prices.get(&CoinId::from("ethereum")), Some(&3100.0));
    }

    #[test]
    fn test_collect_skips_entries_without_usd() {
        let prices = collect_prices(entries(r#"{"bitcoin":{"eur":60000},"dogecoin":{"usd":"n/a"}}"#));
        assert!(prices.is_empty());
    }

    #[test]
    fn test_empty_coin_set_is_noop() {
        // Unroutable base URL: any request would fail
        let provider = CoinGeckoProvider::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let prices = tokio_test::block_on(provider.fetch(&[])).unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_success_with_unknown_coin() {
        let (base, server) = serve_once("200 OK", r#"{"bitcoin":{"usd":65000.5}}"#).await;
        let provider = CoinGeckoProvider::new(base, Duration::from_secs(5)).unwrap();

        let prices = provider.fetch(&coins(&["bitcoin", "dogecoin"])).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(&CoinId::from("bitcoin")), Some(&65000.5));
        assert!(prices.get(&CoinId::from("dogecoin")).is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v3/simple/price?"));
        assert!(request.contains("ids=bitcoin%2Cdogecoin"));
        assert!(request.contains("vs_currencies=usd"));
        assert!(request.to_lowercase().contains("user-agent: coinbar/"));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let (base, server) = serve_once("503 Service Unavailable", "{}").await;
        let provider = CoinGeckoProvider::new(base, Duration::from_secs(5)).unwrap();

        let err = provider.fetch(&coins(&["bitcoin"])).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_rate_limited() {
        let (base, server) = serve_once("429 Too Many Requests", "{}").await;
        let provider = CoinGeckoProvider::new(base, Duration::from_secs(5)).unwrap();

        let err = provider.fetch(&coins(&["bitcoin"])).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_unparseable_body() {
        let (base, server) = serve_once("200 OK", "<html>").await;
        let provider = CoinGeckoProvider::new(base, Duration::from_secs(5)).unwrap();

        let err = provider.fetch(&coins(&["bitcoin"])).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = CoinGeckoProvider::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let err = provider.fetch(&coins(&["bitcoin"])).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        // Accept and hold the connection without answering
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let provider = CoinGeckoProvider::new(base, Duration::from_millis(200)).unwrap();
        let err = provider.fetch(&coins(&["bitcoin"])).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
        server.abort();
    }
}
