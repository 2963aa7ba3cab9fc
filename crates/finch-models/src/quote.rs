use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point-in-time quote from the external market data provider.
///
/// Every field beyond `symbol` may be missing - providers frequently return
/// partial data, and callers must not treat a gap as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub current_price: Option<Decimal>,
    pub week52_high: Option<Decimal>,
    pub week52_low: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub market_cap: Option<i64>,
    /// Percent change over the recent session(s), e.g. -0.45 = down 0.45%.
    pub recent_pct_change: Option<Decimal>,
}

impl QuoteSnapshot {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            current_price: None,
            week52_high: None,
            week52_low: None,
            pe_ratio: None,
            market_cap: None,
            recent_pct_change: None,
        }
    }
}

/// Coarse market-condition bucket derived from where the price sits in its
/// 52-week range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    NearHigh,
    NearLow,
    MidRange,
    Unknown,
}

impl MarketCondition {
    pub fn label(&self) -> &'static str {
        match self {
            MarketCondition::NearHigh => "near 52-week high",
            MarketCondition::NearLow => "near 52-week low",
            MarketCondition::MidRange => "mid-range",
            MarketCondition::Unknown => "unknown",
        }
    }
}

/// Derived per-request view of a quote. Created fresh from a `QuoteSnapshot`,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketContext {
    /// Position of the current price within the 52-week range, clamped to
    /// [0, 100]. `None` when the range is unusable (missing bound or
    /// high == low).
    pub price_position_pct: Option<Decimal>,
    pub condition: MarketCondition,
    pub recent_pct_change: Option<Decimal>,
}
