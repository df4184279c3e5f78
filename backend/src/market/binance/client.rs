use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::logger::warn_if_slow;
use crate::market::binance::errors::ExchangeError;
use crate::market::binance::types::{ExchangeInfo, SymbolInfo, Ticker};
use crate::market::types::Market;

/// Read-only view of an exchange used by the registry and the detector.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Every listing for `market`, tradable or not.
    async fn fetch_symbols(&self, market: Market) -> Result<Vec<SymbolInfo>, ExchangeError>;

    /// Latest 24h ticker for every pair in `market`.
    async fn fetch_tickers(&self, market: Market) -> Result<Vec<Ticker>, ExchangeError>;
}

#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    spot_url: String,
    futures_url: String,
}

impl BinanceClient {
    pub fn new(
        spot_url: String,
        futures_url: String,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            spot_url: spot_url.trim_end_matches('/').to_string(),
            futures_url: futures_url.trim_end_matches('/').to_string(),
        })
    }

    /// Shared connection pool, reused by the image passthrough.
    pub fn http(&self) -> &Client {
        &self.http
    }

    fn base_url(&self, market: Market) -> &str {
        match market {
            Market::Spot => &self.spot_url,
            Market::Futures => &self.futures_url,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ExchangeError> {
        let resp = warn_if_slow("exchange_get", Duration::from_secs(3), async {
            self.http.get(&url).send().await
        })
        .await?
        .error_for_status()?;

        let body = resp.text().await?;

        serde_json::from_str(&body).map_err(|source| ExchangeError::Decode {
            endpoint: url,
            source,
        })
    }
}

#[async_trait]
impl ExchangeApi for BinanceClient {
    #[instrument(skip(self), fields(market = %market), level = "debug")]
    async fn fetch_symbols(&self, market: Market) -> Result<Vec<SymbolInfo>, ExchangeError> {
        let url = format!("{}/exchangeInfo", self.base_url(market));
        let info: ExchangeInfo = self.get_json(url).await?;

        debug!(count = info.symbols.len(), "exchange info fetched");
        Ok(info.symbols)
    }

    #[instrument(skip(self), fields(market = %market), level = "debug")]
    async fn fetch_tickers(&self, market: Market) -> Result<Vec<Ticker>, ExchangeError> {
        let url = format!("{}/ticker/24hr", self.base_url(market));
        let tickers: Vec<Ticker> = self.get_json(url).await?;

        debug!(count = tickers.len(), "tickers fetched");
        Ok(tickers)
    }
}
