use async_trait::async_trait;
use anyhow::{ Context, Result };
use reqwest::{ Client as HttpClient, Url };
use std::time::{ Duration, Instant };
use tracing::{ debug, error };

use crate::error::FetchError;
use crate::exchange::client::DepthSource;
use crate::models::binance_models::BinanceOrderbookSnapshot;
use crate::models::snapshot::Snapshot;

/// Depth limits accepted by `/api/v3/depth`
pub const VALID_DEPTH_LIMITS: [u16; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];

pub struct BinanceClient {
    /// Base URL for API requests, e.g. `https://api.binance.com/api/`
    base_url: Url,

    /// Pooled HTTP client, reused across ticks
    http: HttpClient,
}

impl BinanceClient {
    /// Create a new Binance client
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).context("Invalid API URL")?;

        let http = HttpClient::builder()
            .timeout(request_timeout)
            .tcp_nodelay(true) // Disable Nagle's algorithm for low latency
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(2)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, http })
    }

    /// Full depth URL for a symbol
    pub fn depth_url(&self, symbol: &str, limit: u16) -> Result<Url, FetchError> {
        let mut url = self.base_url
            .join("v3/depth")
            .map_err(|e| FetchError::Request(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("symbol", &symbol.to_uppercase())
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl DepthSource for BinanceClient {
    fn name(&self) -> &str {
        "Binance"
    }

    async fn fetch_snapshot(&self, symbol: &str, limit: u16) -> Result<Snapshot, FetchError> {
        let start = Instant::now();
        let url = self.depth_url(symbol, limit)?;
        debug!(%url, "Fetching depth snapshot");

        let response = self.http.get(url).send().await?;

        // Check if the request was successful
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Binance API error: {} - {}", status, body);
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        let snapshot = BinanceOrderbookSnapshot::from_json(&body)?.into_snapshot(
            &symbol.to_uppercase()
        )?;

        debug!(
            symbol = %snapshot.symbol,
            last_update_id = snapshot.last_update_id,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "Fetched depth snapshot in {:.2?}",
            start.elapsed()
        );

        Ok(snapshot)
    }

    async fn is_operational(&self) -> bool {
        let url = match self.base_url.join("v3/ping") {
            Ok(url) => url,
            Err(_) => {
                return false;
            }
        };

        // Make the request with minimal overhead
        let response = self.http
            .get(url)
            .timeout(Duration::from_secs(2)) // Short timeout for ping
            .send().await;

        match response {
            Ok(res) => res.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_depth_url_with_query() {
        let client = BinanceClient::new("https://api.binance.com/api", Duration::from_secs(1)).unwrap();
        let url = client.depth_url("ethusdt", 100).unwrap();
        assert_eq!(url.as_str(), "https://api.binance.com/api/v3/depth?symbol=ETHUSDT&limit=100");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(BinanceClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
