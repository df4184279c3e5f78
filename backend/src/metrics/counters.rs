use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    pub ticks_ok: Arc<AtomicU64>,
    pub ticks_failed: Arc<AtomicU64>,
    pub events_emitted: Arc<AtomicU64>,

    pub refresh_ok: Arc<AtomicU64>,
    pub refresh_failed: Arc<AtomicU64>,

    pub purged_events: Arc<AtomicU64>,
    pub persist_failures: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
