use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

/// One listing from `/exchangeInfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    /// Raw trading pair, e.g. `ETHUSDT`.
    pub symbol: String,
    pub status: String,
}

impl SymbolInfo {
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }
}

/// One entry from `/ticker/24hr`.
///
/// Prices arrive as decimal strings. The derivatives feed carries no bid.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub last_price: String,
    #[serde(default)]
    pub bid_price: Option<String>,
    #[serde(default)]
    pub close_time: u64,
}

impl Ticker {
    pub fn last_price(&self) -> Option<f64> {
        parse_positive(&self.last_price)
    }

    /// `false` when the bid is missing, zero or not a number.
    pub fn has_live_bid(&self) -> bool {
        self.bid_price.as_deref().and_then(parse_positive).is_some()
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_spot_ticker() {
        let raw = r#"{"symbol":"BTCUSDT","priceChange":"1.0","lastPrice":"64000.01000000",
            "bidPrice":"64000.00000000","closeTime":1700000000000,"count":12}"#;
        let t: Ticker = serde_json::from_str(raw).unwrap();

        assert_eq!(t.last_price(), Some(64000.01));
        assert!(t.has_live_bid());
        assert_eq!(t.close_time, 1_700_000_000_000);
    }

    #[test]
    fn decodes_futures_ticker_without_bid() {
        let raw = r#"{"symbol":"ETHUSDT","lastPrice":"3100.5","closeTime":1700000000000}"#;
        let t: Ticker = serde_json::from_str(raw).unwrap();

        assert!(t.bid_price.is_none());
        assert!(!t.has_live_bid());
    }

    #[test]
    fn zero_and_garbage_prices_are_rejected() {
        let raw = r#"{"symbol":"XUSDT","lastPrice":"0.00000000","bidPrice":"0.00000000"}"#;
        let mut t: Ticker = serde_json::from_str(raw).unwrap();
        assert_eq!(t.last_price(), None);
        assert!(!t.has_live_bid());

        t.last_price = "abc".into();
        assert_eq!(t.last_price(), None);
    }
}
