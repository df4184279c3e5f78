use std::collections::{BTreeMap, VecDeque};

/// Fixed-length trailing price history for one symbol, oldest first.
///
/// A slot holding `0.0` has not been observed yet; zero is never a real price.
/// The length never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceWindow {
    history: VecDeque<f64>,
}

impl PriceWindow {
    pub fn new(len: usize) -> Self {
        Self {
            history: VecDeque::from(vec![0.0; len]),
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Slots from oldest to newest.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Observed (non-zero) slots from oldest to newest.
    pub fn observed(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied().filter(|p| *p != 0.0)
    }

    /// Drops the oldest slot and appends `price` as the newest.
    pub fn slide(&mut self, price: f64) {
        if self.history.pop_front().is_some() {
            self.history.push_back(price);
        }
    }

    /// Clears every slot back to "not observed".
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|p| *p = 0.0);
    }
}

/// Per-market mapping of symbol to price window, kept in lexicographic order.
#[derive(Debug, Clone)]
pub struct PriceWindowStore {
    window_len: usize,
    windows: BTreeMap<String, PriceWindow>,
}

impl PriceWindowStore {
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len: window_len.max(1),
            windows: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceWindow> {
        self.windows.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PriceWindow)> {
        self.windows.iter_mut().map(|(s, w)| (s.as_str(), w))
    }

    /// Replaces the symbol set wholesale.
    ///
    /// Symbols already tracked keep their history, new symbols start with an
    /// all-zero window and symbols no longer listed are dropped.
    pub fn reconcile<I>(&mut self, symbols: I) -> ReconcileSummary
    where
        I: IntoIterator<Item = String>,
    {
        let mut previous = std::mem::take(&mut self.windows);
        let mut summary = ReconcileSummary::default();

        for symbol in symbols {
            if self.windows.contains_key(&symbol) {
                continue;
            }
            let window = match previous.remove(&symbol) {
                Some(w) => {
                    summary.kept += 1;
                    w
                }
                None => {
                    summary.added += 1;
                    PriceWindow::new(self.window_len)
                }
            };
            self.windows.insert(symbol, window);
        }

        summary.removed = previous.len();
        summary
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, symbol: &str) -> Option<&mut PriceWindow> {
        self.windows.get_mut(symbol)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
}
