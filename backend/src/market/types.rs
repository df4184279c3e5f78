use std::fmt;

/// Venue an activity feed is tracked for. The two markets never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Market {
    Spot,
    Futures,
}

/// Every symbol is quoted against this asset, except the spot `USDTTRY` pair.
pub const QUOTE_SUFFIX: &str = "USDT";

/// Spot pair that tracks `USDT` itself, priced in Turkish lira.
const SPOT_USDT_PAIR: &str = "USDTTRY";

impl Market {
    pub const ALL: [Market; 2] = [Market::Spot, Market::Futures];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Futures => "futures",
        }
    }

    /// Maps a raw exchange pair (e.g. `ETHUSDT`) to the tracked base symbol.
    ///
    /// Returns `None` for pairs this market does not track.
    pub fn base_symbol<'a>(&self, pair: &'a str) -> Option<&'a str> {
        if *self == Market::Spot && pair == SPOT_USDT_PAIR {
            return Some(&pair[..QUOTE_SUFFIX.len()]);
        }

        pair.strip_suffix(QUOTE_SUFFIX).filter(|base| !base.is_empty())
    }

    /// Only spot listings are filtered by the configured blacklist.
    pub fn applies_blacklist(&self) -> bool {
        matches!(self, Market::Spot)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quote_suffix() {
        assert_eq!(Market::Spot.base_symbol("ETHUSDT"), Some("ETH"));
        assert_eq!(Market::Futures.base_symbol("1000PEPEUSDT"), Some("1000PEPE"));
        assert_eq!(Market::Spot.base_symbol("ETHBTC"), None);
        assert_eq!(Market::Spot.base_symbol("USDT"), None);
    }

    #[test]
    fn usdt_try_only_on_spot() {
        assert_eq!(Market::Spot.base_symbol("USDTTRY"), Some("USDT"));
        assert_eq!(Market::Futures.base_symbol("USDTTRY"), None);
    }
}
