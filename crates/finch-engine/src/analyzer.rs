//! The analysis pipeline: quote -> context -> focus -> prompt -> model.

use std::sync::Arc;

use finch_models::{
    MarketCondition, MarketContext, ModelResponse, PromptRequest, PromptStrategy, QuoteSnapshot,
    TokenUsage, UserLevel,
};
use finch_store::ResponseCache;
use tracing::{debug, info, warn};

use crate::context::build_market_context;
use crate::error::EngineError;
use crate::invoker::ModelInvoker;
use crate::prompts;
use crate::quotes::{normalize_symbol, QuoteProvider};
use crate::selector::{classify_focus, resolve_sampling};

/// Final answer for one analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub result: String,
    /// Strategy endpoint that produced the result.
    pub method: String,
    pub token_usage: Option<TokenUsage>,
    /// True when the model was unreachable and the templated data-only
    /// summary was served instead.
    pub used_fallback: bool,
}

pub struct Analyzer {
    quotes: Arc<dyn QuoteProvider>,
    invoker: ModelInvoker,
    cache: ResponseCache,
}

impl Analyzer {
    pub fn new(quotes: Arc<dyn QuoteProvider>, invoker: ModelInvoker, cache: ResponseCache) -> Self {
        Self {
            quotes,
            invoker,
            cache,
        }
    }

    /// Quote lookup through the short-TTL cache. A corrupt cache entry is
    /// treated as a miss.
    async fn quote_for(&self, symbol: &str) -> Result<QuoteSnapshot, EngineError> {
        let key = format!("quote:{}", normalize_symbol(symbol));
        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str::<QuoteSnapshot>(&cached) {
                Ok(quote) => {
                    debug!(symbol = %quote.symbol, "Quote cache hit");
                    return Ok(quote);
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding corrupt cache entry"),
            }
        }

        let quote = self.quotes.fetch_quote(symbol).await?;
        self.cache
            .set(key, serde_json::to_string(&quote)?, None)
            .await;
        Ok(quote)
    }

    /// Run one strategy end to end and return the raw model response.
    ///
    /// A missing quote degrades to an all-N/A prompt with an `Unknown`
    /// condition; only the strategy name itself can make this fail before
    /// the model call.
    pub async fn respond(
        &self,
        strategy: PromptStrategy,
        symbol: &str,
        query: &str,
        user_level: UserLevel,
    ) -> Result<ModelResponse, EngineError> {
        let quote = self.quote_for(symbol).await?;

        let market_context = match build_market_context(&quote) {
            Ok(ctx) => ctx,
            Err(EngineError::DataUnavailable(reason)) => {
                debug!(symbol = %quote.symbol, %reason, "Degrading to unknown market context");
                MarketContext {
                    price_position_pct: None,
                    condition: MarketCondition::Unknown,
                    recent_pct_change: None,
                }
            }
            Err(other) => return Err(other),
        };

        let request = PromptRequest {
            strategy,
            symbol: quote.symbol.clone(),
            query: query.to_string(),
            market_context,
            query_focus: classify_focus(query),
            user_level,
        };

        let (params, tone) = resolve_sampling(strategy, &request.market_context);
        let prompt = prompts::assemble(&request, &quote, tone);

        info!(
            strategy = %strategy.endpoint(),
            symbol = %request.symbol,
            focus = %request.query_focus.label(),
            condition = ?request.market_context.condition,
            "Running analysis"
        );

        Ok(self.invoker.invoke(&prompt, &params).await)
    }

    /// User-facing analysis. A failed model response falls back to a
    /// templated summary of the quote data instead of surfacing the error.
    pub async fn analyze(
        &self,
        strategy: PromptStrategy,
        symbol: &str,
        query: &str,
        user_level: UserLevel,
    ) -> Result<AnalysisResponse, EngineError> {
        let response = self.respond(strategy, symbol, query, user_level).await?;

        if response.is_ok() {
            return Ok(AnalysisResponse {
                result: response.text,
                method: strategy.endpoint().to_string(),
                token_usage: response.token_usage,
                used_fallback: false,
            });
        }

        warn!(
            strategy = %strategy.endpoint(),
            error = response.error.as_deref().unwrap_or("unknown"),
            "Model unavailable, serving data-only fallback"
        );
        let quote = self.quote_for(symbol).await?;
        Ok(AnalysisResponse {
            result: fallback_summary(&quote),
            method: strategy.endpoint().to_string(),
            token_usage: None,
            used_fallback: true,
        })
    }
}

/// Deterministic non-AI summary served when the model is unreachable.
/// Reports only the fields actually present in the snapshot.
pub fn fallback_summary(quote: &QuoteSnapshot) -> String {
    let mut lines = vec![format!(
        "Live AI analysis is currently unavailable. Here is the latest data for {}:",
        quote.symbol
    )];

    match quote.current_price {
        Some(price) => lines.push(format!("- Current price: {}", price.normalize())),
        None => lines.push("- Current price: Data not available".to_string()),
    }
    if let (Some(low), Some(high)) = (quote.week52_low, quote.week52_high) {
        lines.push(format!(
            "- 52-week range: {} to {}",
            low.normalize(),
            high.normalize()
        ));
    }
    if let Some(change) = quote.recent_pct_change {
        lines.push(format!("- Recent change: {}%", change.normalize()));
    }
    if let Some(pe) = quote.pe_ratio {
        lines.push(format!("- P/E ratio: {}", pe.normalize()));
    }

    lines.push("Please try again shortly for a full analysis.".to_string());
    lines.join("\n")
}
