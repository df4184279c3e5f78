use serde::{Deserialize, Serialize};

/// A single recorded price move. Immutable once created.
///
/// The field names match the persisted file and the read API payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub symbol: String,
    pub old_price: f64,
    pub new_price: f64,
    /// Percent change from `old_price`, rounded to two decimals.
    #[serde(rename = "change")]
    pub change_percent: f64,
    /// Detection time, epoch milliseconds.
    #[serde(rename = "time")]
    pub timestamp_ms: u64,
}

impl ActivityEvent {
    pub fn new(
        symbol: impl Into<String>,
        old_price: f64,
        new_price: f64,
        timestamp_ms: u64,
    ) -> Self {
        let rate = new_price / old_price;
        Self {
            symbol: symbol.into(),
            old_price,
            new_price,
            change_percent: round2((rate - 1.0) * 100.0),
            timestamp_ms,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Newest-first sequence of events for one market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog {
    events: Vec<ActivityEvent>,
}

impl ActivityLog {
    pub fn new(events: Vec<ActivityEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Places `batch` in front of the existing events, keeping the batch order.
    pub fn prepend(&mut self, batch: Vec<ActivityEvent>) {
        if batch.is_empty() {
            return;
        }
        let older = std::mem::replace(&mut self.events, batch);
        self.events.extend(older);
    }

    /// Keeps only events strictly newer than `now_ms - retention_ms` and returns
    /// how many were dropped. Relative order is preserved.
    pub fn retain_recent(&mut self, now_ms: u64, retention_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(retention_ms);
        let before = self.events.len();
        self.events.retain(|e| e.timestamp_ms > cutoff);
        before - self.events.len()
    }
}
