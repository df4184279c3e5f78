//! Symbol registry: turns an exchange listing into the tracked symbol set.

use crate::market::binance::SymbolInfo;
use crate::market::types::Market;

/// Filters `listings` down to trading pairs quoted in the market's quote
/// asset, strips the suffix, drops blacklisted symbols (spot only) and
/// returns the result sorted and deduplicated.
pub fn tradable_symbols(
    market: Market,
    listings: &[SymbolInfo],
    blacklist: &[String],
) -> Vec<String> {
    let mut symbols: Vec<String> = listings
        .iter()
        .filter(|l| l.is_trading())
        .filter_map(|l| market.base_symbol(&l.symbol))
        .filter(|s| !(market.applies_blacklist() && blacklist.iter().any(|b| b == s)))
        .map(str::to_string)
        .collect();

    symbols.sort();
    symbols.dedup();
    symbols
}
