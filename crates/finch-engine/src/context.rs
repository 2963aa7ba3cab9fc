use finch_models::{MarketCondition, MarketContext, QuoteSnapshot};
use rust_decimal::Decimal;

use crate::error::EngineError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const NEAR_HIGH_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
const NEAR_LOW_THRESHOLD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Derive a `MarketContext` from a quote snapshot. Pure transform, no I/O.
///
/// Errors with `DataUnavailable` only when the current price itself is
/// missing; an unusable 52-week range degrades to `Unknown` instead, since
/// callers branch on the condition trichotomy and must not see a fourth
/// silent state.
pub fn build_market_context(quote: &QuoteSnapshot) -> Result<MarketContext, EngineError> {
    let price = quote.current_price.ok_or_else(|| {
        EngineError::DataUnavailable(format!("no current price for {}", quote.symbol))
    })?;

    let (position, condition) = match (quote.week52_low, quote.week52_high) {
        (Some(low), Some(high)) if high > low => {
            // Clamp: stale bounds can put the live price outside the range.
            let raw = (price - low) / (high - low) * HUNDRED;
            let position = raw.clamp(Decimal::ZERO, HUNDRED);
            let condition = if position > NEAR_HIGH_THRESHOLD {
                MarketCondition::NearHigh
            } else if position < NEAR_LOW_THRESHOLD {
                MarketCondition::NearLow
            } else {
                MarketCondition::MidRange
            };
            (Some(position), condition)
        }
        // high == low, inverted, or either bound missing.
        _ => (None, MarketCondition::Unknown),
    };

    Ok(MarketContext {
        price_position_pct: position,
        condition,
        recent_pct_change: quote.recent_pct_change,
    })
}
