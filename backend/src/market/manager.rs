//! Per-market state owner.
//!
//! A `MarketManager` holds everything one market needs: the price windows,
//! the activity log and handles to the exchange and the repository. The two
//! markets each get their own manager and never share mutable state.
//!
//! Locking:
//! - Network calls run before any lock is taken, so a failed fetch leaves
//!   state untouched.
//! - `write_lock` is held across every log mutation and the persist that
//!   follows it, so a purge and a detection tick can never interleave their
//!   writes.
//! - Readers only clone the `Arc` behind `log` and never wait on disk I/O.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::activity::detector::{self, DetectionRules};
use crate::activity::{ActivityEvent, ActivityLog};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::logger::warn_if_slow;
use crate::market::binance::ExchangeApi;
use crate::market::registry;
use crate::market::types::Market;
use crate::market::window::{PriceWindow, PriceWindowStore, ReconcileSummary};
use crate::metrics::counters::Counters;
use crate::persistence::ActivityRepository;

/// Tunables shared by both markets.
#[derive(Debug, Clone)]
pub struct MarketSettings {
    pub window_len: usize,
    pub retention: Duration,
    pub spot_blacklist: Vec<String>,
    pub rules: DetectionRules,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl MarketSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            window_len: cfg.window_len,
            retention: cfg.retention,
            spot_blacklist: cfg.spot_blacklist.clone(),
            rules: DetectionRules::from_config(cfg),
        }
    }
}

pub struct MarketManager {
    market: Market,
    exchange: Arc<dyn ExchangeApi>,
    repo: Arc<dyn ActivityRepository>,
    settings: MarketSettings,

    windows: Mutex<PriceWindowStore>,
    log: RwLock<Arc<ActivityLog>>,
    write_lock: Mutex<()>,

    counters: Counters,
}

impl MarketManager {
    pub fn new(
        market: Market,
        exchange: Arc<dyn ExchangeApi>,
        repo: Arc<dyn ActivityRepository>,
        settings: MarketSettings,
        counters: Counters,
    ) -> Self {
        Self {
            market,
            exchange,
            repo,
            windows: Mutex::new(PriceWindowStore::new(settings.window_len)),
            settings,
            log: RwLock::new(Arc::new(ActivityLog::default())),
            write_lock: Mutex::new(()),
            counters,
        }
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Latest published activity log, newest first.
    pub fn snapshot(&self) -> Arc<ActivityLog> {
        self.log.read().clone()
    }

    pub async fn window(&self, symbol: &str) -> Option<PriceWindow> {
        self.windows.lock().await.get(symbol).cloned()
    }

    pub async fn symbols(&self) -> Vec<String> {
        self.windows
            .lock()
            .await
            .symbols()
            .map(str::to_string)
            .collect()
    }

    /// Loads the persisted log into memory. A missing or unreadable file
    /// starts the market with an empty log.
    #[instrument(skip(self), fields(market = %self.market))]
    pub async fn load(&self) -> usize {
        let _guard = self.write_lock.lock().await;

        let log = match self.repo.load(self.market).await {
            Ok(log) => log,
            Err(e) => {
                warn!(error = %e, "activity log unreadable; starting empty");
                ActivityLog::default()
            }
        };

        let count = log.len();
        *self.log.write() = Arc::new(log);

        info!(events = count, "activity log restored");
        count
    }

    /// Re-fetches the tradable symbol set and reconciles the windows.
    #[instrument(skip(self), fields(market = %self.market))]
    pub async fn refresh_symbols(&self) -> Result<ReconcileSummary, AppError> {
        let listings = match self.exchange.fetch_symbols(self.market).await {
            Ok(l) => l,
            Err(e) => {
                Counters::bump(&self.counters.refresh_failed, 1);
                return Err(e.into());
            }
        };

        let symbols =
            registry::tradable_symbols(self.market, &listings, &self.settings.spot_blacklist);

        let summary = self.windows.lock().await.reconcile(symbols);
        Counters::bump(&self.counters.refresh_ok, 1);

        info!(
            kept = summary.kept,
            added = summary.added,
            removed = summary.removed,
            "symbol registry refreshed"
        );
        Ok(summary)
    }

    /// One detection pass. Returns the events appended to the log.
    #[instrument(skip(self), fields(market = %self.market))]
    pub async fn tick(&self, now_ms: u64) -> Result<Vec<ActivityEvent>, AppError> {
        if self.windows.lock().await.is_empty() {
            debug!("no symbols registered yet; skipping tick");
            return Ok(Vec::new());
        }

        let tickers = match warn_if_slow(
            "fetch_tickers",
            Duration::from_secs(5),
            self.exchange.fetch_tickers(self.market),
        )
        .await
        {
            Ok(t) => t,
            Err(e) => {
                Counters::bump(&self.counters.ticks_failed, 1);
                return Err(e.into());
            }
        };

        let prices = self
            .settings
            .rules
            .latest_prices(self.market, &tickers, now_ms);

        let _guard = self.write_lock.lock().await;

        let events = {
            let mut windows = self.windows.lock().await;
            detector::detect(&self.settings.rules, &mut windows, &prices, now_ms)
        };

        Counters::bump(&self.counters.ticks_ok, 1);
        debug!(priced = prices.len(), events = events.len(), "detection pass done");

        if events.is_empty() {
            return Ok(events);
        }

        Counters::bump(&self.counters.events_emitted, events.len() as u64);
        for e in &events {
            info!(
                symbol = %e.symbol,
                old_price = e.old_price,
                new_price = e.new_price,
                change = e.change_percent,
                "activity detected"
            );
        }

        let log = self.publish(|log| log.prepend(events.clone()));
        self.persist(&log).await;

        Ok(events)
    }

    /// Drops events older than the retention horizon and persists the
    /// result, even when nothing was removed. Returns the number removed.
    #[instrument(skip(self), fields(market = %self.market))]
    pub async fn purge(&self, now_ms: u64) -> usize {
        let retention_ms = self.settings.retention.as_millis() as u64;

        let _guard = self.write_lock.lock().await;

        let mut removed = 0;
        let log = self.publish(|log| removed = log.retain_recent(now_ms, retention_ms));
        Counters::bump(&self.counters.purged_events, removed as u64);

        self.persist(&log).await;

        debug!(removed, remaining = log.len(), "purge complete");
        removed
    }

    /// Applies `f` to a copy of the current log and swaps it in.
    /// Callers must hold `write_lock`.
    fn publish<F>(&self, f: F) -> Arc<ActivityLog>
    where
        F: FnOnce(&mut ActivityLog),
    {
        let mut next = ActivityLog::clone(&self.snapshot());
        f(&mut next);

        let next = Arc::new(next);
        *self.log.write() = Arc::clone(&next);
        next
    }

    /// In-memory state stays authoritative when the write fails; the next
    /// successful write restores durability.
    async fn persist(&self, log: &ActivityLog) {
        let res = warn_if_slow(
            "persist_activity",
            Duration::from_millis(500),
            self.repo.save(self.market, log),
        )
        .await;

        if let Err(e) = res {
            Counters::bump(&self.counters.persist_failures, 1);
            warn!(error = %e, "failed to persist activity log");
        }
    }
}
