use finch_models::{MarketCondition, MarketContext, PromptStrategy, QueryFocus, SamplingParams, Tone};

use crate::error::EngineError;

/// Keyword sets for query-focus classification, scanned in strict priority
/// order: technical > fundamental > recommendation. First matching set wins;
/// ambiguous or negated queries fall through to Comprehensive rather than
/// guessing.
const TECHNICAL_TERMS: &[&str] = &[
    "rsi", "macd", "sma", "ema", "chart", "charts", "trend", "trends", "momentum", "support",
    "resistance", "breakout", "volume", "indicator", "indicators", "technical", "oversold",
    "overbought",
];

const FUNDAMENTAL_TERMS: &[&str] = &[
    "pe", "p/e", "ratio", "ratios", "earnings", "revenue", "profit", "margins", "valuation",
    "dividend", "dividends", "debt", "eps", "fundamentals", "fundamental", "undervalued",
    "overvalued", "balance",
];

const RECOMMENDATION_TERMS: &[&str] = &[
    "buy", "sell", "hold", "invest", "investment", "recommend", "recommendation", "should",
    "entry", "exit", "target", "worth",
];

/// Classify what the query is mostly about by lowercase word membership.
pub fn classify_focus(query: &str) -> QueryFocus {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '/')
        .filter(|w| !w.is_empty())
        .collect();

    let contains_any = |terms: &[&str]| words.iter().any(|w| terms.contains(w));

    if contains_any(TECHNICAL_TERMS) {
        QueryFocus::Technical
    } else if contains_any(FUNDAMENTAL_TERMS) {
        QueryFocus::Fundamental
    } else if contains_any(RECOMMENDATION_TERMS) {
        QueryFocus::Recommendation
    } else {
        QueryFocus::Comprehensive
    }
}

/// Resolve an endpoint name to a strategy. Unknown names are an error,
/// never a silent default.
pub fn parse_strategy(endpoint: &str) -> Result<PromptStrategy, EngineError> {
    PromptStrategy::ALL
        .into_iter()
        .find(|s| s.endpoint() == endpoint)
        .ok_or_else(|| EngineError::InvalidStrategy(endpoint.to_string()))
}

/// Fixed sampling parameters for the non-dynamic strategies.
pub fn base_sampling_params(strategy: PromptStrategy) -> SamplingParams {
    match strategy {
        PromptStrategy::OneShot => SamplingParams::new(0.3, 0.80, 40, 1024),
        PromptStrategy::MultiShot => SamplingParams::new(0.4, 0.90, 40, 1536),
        PromptStrategy::ChainOfThought => SamplingParams::new(0.2, 0.80, 32, 2048),
        PromptStrategy::Rtfc => SamplingParams::new(0.3, 0.85, 40, 1536),
        // Dynamic derives from market condition; this is its balanced base.
        PromptStrategy::Dynamic => SamplingParams::new(0.3, 0.85, 40, 1536),
    }
}

/// Tone and sampling derivation for the dynamic strategy.
///
/// Near the 52-week high the model is sampled conservatively and asked for
/// caution; near the low, sampling widens to hunt for opportunities.
pub fn dynamic_sampling_params(context: &MarketContext) -> (SamplingParams, Tone) {
    match context.condition {
        MarketCondition::NearHigh => (SamplingParams::new(0.2, 0.75, 24, 1536), Tone::Cautious),
        MarketCondition::NearLow => (SamplingParams::new(0.4, 0.95, 64, 1536), Tone::Opportunistic),
        MarketCondition::MidRange | MarketCondition::Unknown => {
            (SamplingParams::new(0.3, 0.85, 40, 1536), Tone::Balanced)
        }
    }
}

/// Select the sampling parameters (and tone) for a request.
pub fn resolve_sampling(strategy: PromptStrategy, context: &MarketContext) -> (SamplingParams, Tone) {
    match strategy {
        PromptStrategy::Dynamic => dynamic_sampling_params(context),
        other => (base_sampling_params(other), Tone::Balanced),
    }
}
