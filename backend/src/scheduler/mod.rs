//! Periodic task wiring.
//!
//! Per market: a slow symbol-registry refresh and a fast detection tick.
//! One purge loop sweeps every market on a shared interval. Each run is
//! contained: an error is logged and the loop waits for its next tick.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, info};

use crate::config::AppConfig;
use crate::logger::task_span;
use crate::market::manager::MarketManager;
use crate::time::now_ms;

#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub symbol_refresh_every: Duration,
    pub detect_every: Duration,
    pub purge_every: Duration,
}

impl Cadence {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            symbol_refresh_every: cfg.symbol_refresh_every,
            detect_every: cfg.detect_every,
            purge_every: cfg.purge_every,
        }
    }
}

/// Starts every periodic task. The first run of each happens immediately.
pub fn spawn_all(markets: &[Arc<MarketManager>], cadence: Cadence) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(markets.len() * 2 + 1);

    for mm in markets {
        handles.push(spawn_refresh_loop(Arc::clone(mm), cadence.symbol_refresh_every));
        handles.push(spawn_detect_loop(Arc::clone(mm), cadence.detect_every));
    }
    handles.push(spawn_purge_loop(markets.to_vec(), cadence.purge_every));

    info!(
        markets = markets.len(),
        refresh_ms = cadence.symbol_refresh_every.as_millis() as u64,
        detect_ms = cadence.detect_every.as_millis() as u64,
        purge_ms = cadence.purge_every.as_millis() as u64,
        "periodic tasks started"
    );

    handles
}

pub fn spawn_refresh_loop(mm: Arc<MarketManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let span = task_span("symbol_refresh", mm.market());
            if let Err(e) = mm.refresh_symbols().instrument(span.clone()).await {
                span.in_scope(|| {
                    error!(error = %e, network = e.is_network(), "symbol refresh failed")
                });
            }
        }
    })
}

pub fn spawn_detect_loop(mm: Arc<MarketManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let span = task_span("detect", mm.market());
            if let Err(e) = mm.tick(now_ms()).instrument(span.clone()).await {
                span.in_scope(|| {
                    error!(error = %e, network = e.is_network(), "detection tick failed")
                });
            }
        }
    })
}

pub fn spawn_purge_loop(markets: Vec<Arc<MarketManager>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let now = now_ms();
            join_all(
                markets
                    .iter()
                    .map(|mm| mm.purge(now).instrument(task_span("purge", mm.market()))),
            )
            .await;
        }
    })
}
