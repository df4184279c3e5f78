//! Price activity detection.
//!
//! Every tick, each tracked symbol's latest price is compared against the
//! observed slots of its window, oldest first. The first slot whose ratio
//! falls outside the applicable band produces an [`ActivityEvent`], and the
//! window is cleared so the same move cannot fire again until fresh samples
//! accumulate. Whether or not it fired, the latest price is then slid in as
//! the newest sample.

use std::collections::{HashMap, HashSet};

use crate::activity::log::ActivityEvent;
use crate::config::AppConfig;
use crate::market::binance::Ticker;
use crate::market::types::Market;
use crate::market::window::{PriceWindow, PriceWindowStore};

/// Inclusive trigger bounds on `current / reference`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand {
    pub low: f64,
    pub high: f64,
}

impl ThresholdBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `±pct` percent around parity, e.g. `1.0` gives `[0.99, 1.01]`.
    pub fn symmetric_pct(pct: f64) -> Self {
        let delta = pct / 100.0;
        Self::new(1.0 - delta, 1.0 + delta)
    }

    /// A ratio sitting exactly on a bound counts as a breach.
    pub fn is_breached(&self, rate: f64) -> bool {
        rate <= self.low || rate >= self.high
    }
}

#[derive(Debug, Clone)]
pub struct DetectionRules {
    /// Symbols also checked against the tighter `major` band.
    pub major_assets: HashSet<String>,
    /// ±1% by default.
    pub major: ThresholdBand,
    /// ±3% by default; applies to every symbol.
    pub general: ThresholdBand,
    /// Derivatives tickers closed longer ago than this are skipped.
    pub stale_contract_ms: u64,
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl DetectionRules {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            major_assets: cfg.major_assets.iter().cloned().collect(),
            major: ThresholdBand::symmetric_pct(cfg.major_band_pct),
            general: ThresholdBand::symmetric_pct(cfg.general_band_pct),
            stale_contract_ms: cfg.stale_contract_after.as_millis() as u64,
        }
    }

    pub fn is_activity(&self, symbol: &str, rate: f64) -> bool {
        (self.major_assets.contains(symbol) && self.major.is_breached(rate))
            || self.general.is_breached(rate)
    }

    /// Finds the oldest observed slot that `current` diverges from.
    ///
    /// Returns the reference price of that slot.
    pub fn find_reference(
        &self,
        symbol: &str,
        window: &PriceWindow,
        current: f64,
    ) -> Option<f64> {
        window
            .observed()
            .find(|reference| self.is_activity(symbol, current / reference))
    }

    /// Extracts usable `symbol -> last price` pairs from a ticker response.
    ///
    /// Spot quotes need a live bid; derivatives quotes must not be past the
    /// stale-contract horizon. Unparseable prices are dropped.
    pub fn latest_prices(
        &self,
        market: Market,
        tickers: &[Ticker],
        now_ms: u64,
    ) -> HashMap<String, f64> {
        tickers
            .iter()
            .filter(|t| match market {
                Market::Spot => t.has_live_bid(),
                Market::Futures => {
                    now_ms <= t.close_time.saturating_add(self.stale_contract_ms)
                }
            })
            .filter_map(|t| {
                let symbol = market.base_symbol(&t.symbol)?;
                Some((symbol.to_string(), t.last_price()?))
            })
            .collect()
    }
}

/// Runs one detection pass over `store`, mutating every window that has a
/// current price and returning the events in symbol order.
///
/// Symbols without a current price are left untouched.
pub fn detect(
    rules: &DetectionRules,
    store: &mut PriceWindowStore,
    prices: &HashMap<String, f64>,
    now_ms: u64,
) -> Vec<ActivityEvent> {
    let mut events = Vec::new();

    for (symbol, window) in store.iter_mut() {
        let Some(&current) = prices.get(symbol) else {
            continue;
        };

        if let Some(reference) = rules.find_reference(symbol, window, current) {
            events.push(ActivityEvent::new(symbol, reference, current, now_ms));
            window.reset();
        }

        window.slide(current);
    }

    events
}
