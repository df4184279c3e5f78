#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use activity_backend::activity::ActivityLog;
use activity_backend::market::binance::{ExchangeApi, ExchangeError, SymbolInfo, Ticker};
use activity_backend::market::manager::{MarketManager, MarketSettings};
use activity_backend::market::types::Market;
use activity_backend::metrics::counters::Counters;
use activity_backend::persistence::{ActivityRepository, PersistenceError};

#[derive(Default)]
struct MarketFeed {
    listings: Vec<SymbolInfo>,
    tickers: HashMap<String, Ticker>,
    fail: bool,
}

/// Exchange whose listings and prices are set by the test.
///
/// A market flagged with `fail_with_garbage` returns a decode error, which
/// exercises the same abort path as a network failure without sockets.
#[derive(Default)]
pub struct MockExchange {
    feeds: Mutex<HashMap<Market, MarketFeed>>,
    pub ticker_calls: AtomicUsize,
    pub symbol_calls: AtomicUsize,
}

impl MockExchange {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn list(&self, market: Market, pairs: &[&str]) {
        self.feeds.lock().entry(market).or_default().listings = pairs
            .iter()
            .map(|p| SymbolInfo {
                symbol: p.to_string(),
                status: "TRADING".to_string(),
            })
            .collect();
    }

    pub fn set_price(&self, market: Market, pair: &str, price: f64, close_time: u64) {
        self.feeds.lock().entry(market).or_default().tickers.insert(
            pair.to_string(),
            Ticker {
                symbol: pair.to_string(),
                last_price: price.to_string(),
                bid_price: match market {
                    Market::Spot => Some(price.to_string()),
                    Market::Futures => None,
                },
                close_time,
            },
        );
    }

    pub fn fail_with_garbage(&self, market: Market, fail: bool) {
        self.feeds.lock().entry(market).or_default().fail = fail;
    }

    fn decode_error() -> ExchangeError {
        let source = serde_json::from_str::<Vec<Ticker>>("<html>").unwrap_err();
        ExchangeError::Decode {
            endpoint: "mock".to_string(),
            source,
        }
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    async fn fetch_symbols(&self, market: Market) -> Result<Vec<SymbolInfo>, ExchangeError> {
        self.symbol_calls.fetch_add(1, Ordering::SeqCst);
        let feeds = self.feeds.lock();
        let feed = feeds.get(&market);
        if feed.is_some_and(|f| f.fail) {
            return Err(Self::decode_error());
        }
        Ok(feed.map(|f| f.listings.clone()).unwrap_or_default())
    }

    async fn fetch_tickers(&self, market: Market) -> Result<Vec<Ticker>, ExchangeError> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        let feeds = self.feeds.lock();
        let feed = feeds.get(&market);
        if feed.is_some_and(|f| f.fail) {
            return Err(Self::decode_error());
        }
        Ok(feed
            .map(|f| f.tickers.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// In-memory repository that records every save.
#[derive(Default)]
pub struct MemoryRepository {
    pub saves: Mutex<Vec<(Market, ActivityLog)>>,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn save_count(&self, market: Market) -> usize {
        self.saves.lock().iter().filter(|(m, _)| *m == market).count()
    }
}

#[async_trait]
impl ActivityRepository for MemoryRepository {
    async fn load(&self, market: Market) -> Result<ActivityLog, PersistenceError> {
        Ok(self
            .saves
            .lock()
            .iter()
            .rev()
            .find(|(m, _)| *m == market)
            .map(|(_, l)| l.clone())
            .unwrap_or_default())
    }

    async fn save(&self, market: Market, log: &ActivityLog) -> Result<(), PersistenceError> {
        self.saves.lock().push((market, log.clone()));
        Ok(())
    }
}

pub fn manager(
    market: Market,
    exchange: Arc<MockExchange>,
    repo: Arc<dyn ActivityRepository>,
) -> Arc<MarketManager> {
    Arc::new(MarketManager::new(
        market,
        exchange,
        repo,
        MarketSettings::default(),
        Counters::default(),
    ))
}
