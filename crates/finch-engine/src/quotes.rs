//! Quote lookup seam and the built-in demo provider.
//!
//! The demo provider serves a fixed table of plausible figures so the whole
//! pipeline runs offline. Unknown symbols yield an empty snapshot rather
//! than an error; downstream rendering degrades those fields to N/A.

use async_trait::async_trait;
use finch_models::QuoteSnapshot;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::EngineError;

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, EngineError>;
}

/// Uppercase and strip the NSE suffix, so "reliance.ns" and "RELIANCE"
/// resolve to the same entry.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    upper.strip_suffix(".NS").unwrap_or(&upper).to_string()
}

#[derive(Default)]
pub struct DemoQuoteProvider;

impl DemoQuoteProvider {
    pub fn new() -> Self {
        Self
    }
}

fn dec(value: &str) -> Option<Decimal> {
    value.parse().ok()
}

fn demo_quote(symbol: &str) -> Option<QuoteSnapshot> {
    // (price, high, low, pe, market_cap, pct_change)
    let row = match symbol {
        "RELIANCE" => ("2450.00", "2800.00", "2100.00", "27.4", 16_580_000_000_000, "-0.45"),
        "TCS" => ("3789.15", "4150.00", "3400.00", "29.8", 13_720_000_000_000, "1.23"),
        "INFY" => ("1500.25", "1620.00", "1350.00", "24.1", 6_230_000_000_000, "0.85"),
        "HDFCBANK" => ("1654.80", "1790.00", "1480.00", "18.6", 12_560_000_000_000, "0.67"),
        "ICICIBANK" => ("1125.40", "1180.00", "880.00", "17.2", 7_890_000_000_000, "0.31"),
        "AAPL" => ("189.95", "199.62", "164.08", "31.5", 2_950_000_000_000, "0.12"),
        _ => return None,
    };

    Some(QuoteSnapshot {
        symbol: symbol.to_string(),
        current_price: dec(row.0),
        week52_high: dec(row.1),
        week52_low: dec(row.2),
        pe_ratio: dec(row.3),
        market_cap: Some(row.4),
        recent_pct_change: dec(row.5),
    })
}

#[async_trait]
impl QuoteProvider for DemoQuoteProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, EngineError> {
        let normalized = normalize_symbol(symbol);
        match demo_quote(&normalized) {
            Some(quote) => Ok(quote),
            None => {
                debug!(symbol = %normalized, "No demo quote, returning empty snapshot");
                Ok(QuoteSnapshot::empty(&normalized))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn known_symbol_returns_full_quote() {
        let provider = DemoQuoteProvider::new();
        let quote = provider.fetch_quote("RELIANCE").await.unwrap();
        assert_eq!(quote.current_price, Some(dec!(2450.00)));
        assert_eq!(quote.week52_high, Some(dec!(2800.00)));
        assert_eq!(quote.week52_low, Some(dec!(2100.00)));
    }

    #[tokio::test]
    async fn symbol_normalization() {
        let provider = DemoQuoteProvider::new();
        let a = provider.fetch_quote("reliance.ns").await.unwrap();
        let b = provider.fetch_quote(" RELIANCE ").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn unknown_symbol_yields_empty_snapshot_not_error() {
        let provider = DemoQuoteProvider::new();
        let quote = provider.fetch_quote("PORTFOLIO").await.unwrap();
        assert_eq!(quote.symbol, "PORTFOLIO");
        assert!(quote.current_price.is_none());
    }
}
