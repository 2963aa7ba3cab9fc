//! Prompt assembly for every strategy.
//!
//! Each strategy owns a fixed template skeleton filled in a single
//! interpolation pass. The closed-world contract applies everywhere: any
//! field missing from the quote renders literally as "N/A", never silently
//! omitted, so the model cannot infer a plausible-looking substitute.

use finch_models::{
    ChatMessage, MarketCondition, PromptRequest, QuoteSnapshot, Tone, UserLevel,
};
use rust_decimal::Decimal;

/// The rendered prompt: flat text for the single-shot variants, or
/// role-tagged segments for variants that separate instruction from data.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledPrompt {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl AssembledPrompt {
    /// Concatenated system-role text, if any.
    pub fn system_text(&self) -> Option<String> {
        match self {
            AssembledPrompt::Text(_) => None,
            AssembledPrompt::Messages(messages) => {
                let joined: Vec<&str> = messages
                    .iter()
                    .filter(|m| m.role == finch_models::ChatRole::System)
                    .map(|m| m.text.as_str())
                    .collect();
                if joined.is_empty() {
                    None
                } else {
                    Some(joined.join("\n\n"))
                }
            }
        }
    }

    /// The user-facing portion (or the whole prompt for flat text).
    pub fn user_text(&self) -> String {
        match self {
            AssembledPrompt::Text(text) => text.clone(),
            AssembledPrompt::Messages(messages) => messages
                .iter()
                .filter(|m| m.role != finch_models::ChatRole::System)
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// Everything, in order. Used by tests and logging.
    pub fn flattened(&self) -> String {
        match self {
            AssembledPrompt::Text(text) => text.clone(),
            AssembledPrompt::Messages(messages) => messages
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

fn fmt_opt(value: Option<Decimal>) -> String {
    match value {
        Some(v) => v.normalize().to_string(),
        None => "N/A".to_string(),
    }
}

fn fmt_pct(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}%", v.normalize()),
        None => "N/A".to_string(),
    }
}

fn fmt_market_cap(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

/// The live-data block shared by every template. Missing fields render as
/// "N/A" per the closed-world contract.
fn data_block(request: &PromptRequest, quote: &QuoteSnapshot) -> String {
    let position = match request.market_context.price_position_pct {
        Some(p) => format!(
            "{}% of 52-week range ({})",
            p.round_dp(1).normalize(),
            request.market_context.condition.label()
        ),
        None => format!("N/A ({})", request.market_context.condition.label()),
    };

    format!(
        "STOCK DATA ({symbol}):\n\
         - Current Price: {price}\n\
         - 52-Week High: {high}\n\
         - 52-Week Low: {low}\n\
         - P/E Ratio: {pe}\n\
         - Market Cap: {cap}\n\
         - Recent Change: {change}\n\
         - Range Position: {position}",
        symbol = request.symbol,
        price = fmt_opt(quote.current_price),
        high = fmt_opt(quote.week52_high),
        low = fmt_opt(quote.week52_low),
        pe = fmt_opt(quote.pe_ratio),
        cap = fmt_market_cap(quote.market_cap),
        change = fmt_pct(quote.recent_pct_change),
        position = position,
    )
}

/// Closed-world ground rules included in every template.
fn closed_world_rules() -> &'static str {
    "STRICT RULES:\n\
     1. ONLY use the data provided below - NEVER invent, estimate, or guess figures\n\
     2. If a field shows N/A, state \"Data not available\" for it\n\
     3. Do not make up historical prices or metrics that are not listed\n\
     4. Format numbers clearly and keep the response professional"
}

/// One-shot: a single worked example on a fixed fictitious stock, then the
/// live data. The example teaches output shape, not content.
pub fn one_shot_prompt(request: &PromptRequest, quote: &QuoteSnapshot) -> AssembledPrompt {
    let text = format!(
        "You are a financial analysis assistant.\n\n\
         {rules}\n\n\
         EXAMPLE ANALYSIS (fictitious stock, format reference only):\n\
         STOCK DATA (ACME):\n\
         - Current Price: 500\n\
         - 52-Week High: 650\n\
         - 52-Week Low: 400\n\
         - P/E Ratio: 18.2\n\
         - Recent Change: 1.2%\n\n\
         ANALYSIS:\n\
         ACME trades at 500, which sits 40% into its 52-week range of 400-650. \
         The P/E of 18.2 is moderate. With a recent gain of 1.2%, momentum is \
         mildly positive. Summary: mid-range positioning, moderate valuation, \
         no extreme signals in the provided data.\n\n\
         Now analyze the following stock in the same format, using ONLY the \
         data provided.\n\n\
         {data}\n\n\
         USER QUERY: {query}\n\n\
         Your analysis:",
        rules = closed_world_rules(),
        data = data_block(request, quote),
        query = request.query,
    );
    AssembledPrompt::Text(text)
}

/// Multi-shot: three tone-calibration exemplars spanning bullish, bearish,
/// and neutral readings, then the live data.
pub fn multi_shot_prompt(request: &PromptRequest, quote: &QuoteSnapshot) -> AssembledPrompt {
    let text = format!(
        "You are a financial analysis assistant.\n\n\
         {rules}\n\n\
         EXAMPLE 1 - BULLISH READING (fictitious):\n\
         Data: price 120, 52-week range 80-125, recent change +2.5%\n\
         Analysis: Trading near the top of its range with positive momentum. \
         The provided data points to continued strength, though proximity to \
         the 52-week high warrants watching for resistance.\n\n\
         EXAMPLE 2 - BEARISH READING (fictitious):\n\
         Data: price 85, 52-week range 80-160, recent change -3.1%\n\
         Analysis: Trading near the bottom of its range with negative momentum. \
         The provided data shows sustained weakness; no reversal signal is \
         present in the supplied figures.\n\n\
         EXAMPLE 3 - NEUTRAL READING (fictitious):\n\
         Data: price 50, 52-week range 40-60, recent change 0.2%\n\
         Analysis: Mid-range position with flat momentum. The provided data \
         is balanced and supports neither a bullish nor bearish tilt.\n\n\
         Match the tone of your analysis to what the data actually shows, as \
         calibrated by the examples above. Use ONLY the data provided.\n\n\
         {data}\n\n\
         USER QUERY: {query}\n\n\
         Your analysis:",
        rules = closed_world_rules(),
        data = data_block(request, quote),
        query = request.query,
    );
    AssembledPrompt::Text(text)
}

/// Chain-of-thought: instruction and data are separated, and the model is
/// told to narrate five labeled reasoning steps in order.
pub fn chain_of_thought_prompt(request: &PromptRequest, quote: &QuoteSnapshot) -> AssembledPrompt {
    let system = format!(
        "You are a financial analysis assistant that reasons step by step.\n\n\
         {rules}\n\n\
         Work through EXACTLY these five steps, labeling each one:\n\
         STEP 1 - DATA INTERPRETATION: restate the provided figures and note any gaps.\n\
         STEP 2 - TECHNICAL VIEW: position within the 52-week range and recent momentum.\n\
         STEP 3 - FUNDAMENTAL VIEW: what the P/E ratio and market cap indicate, if provided.\n\
         STEP 4 - RISK ASSESSMENT: risks visible in the provided data, including missing data.\n\
         STEP 5 - CONCLUSION: a direct answer to the user's query based only on steps 1-4.",
        rules = closed_world_rules(),
    );

    let user = format!(
        "{data}\n\nUSER QUERY: {query}",
        data = data_block(request, quote),
        query = request.query,
    );

    AssembledPrompt::Messages(vec![ChatMessage::system(system), ChatMessage::user(user)])
}

fn complexity_clause(level: UserLevel) -> &'static str {
    match level {
        UserLevel::Beginner => {
            "Explain in plain language, define any financial term you use, and keep it short."
        }
        UserLevel::General => {
            "Use accessible language with brief explanations of technical terms."
        }
        UserLevel::Advanced => {
            "Use professional terminology freely and go straight to the substantive points."
        }
    }
}

fn tone_clause(tone: Tone, condition: MarketCondition) -> String {
    let base = match tone {
        Tone::Cautious => {
            "Adopt a CAUTIOUS tone: emphasize downside risks and avoid enthusiasm."
        }
        Tone::Opportunistic => {
            "Adopt an OPPORTUNISTIC tone: note potential value, while staying factual."
        }
        Tone::Balanced => "Adopt a BALANCED tone: weigh positives and negatives evenly.",
    };
    format!(
        "{base} The stock is currently {condition}.",
        base = base,
        condition = condition.label()
    )
}

/// Dynamic: tone, focus, and complexity clauses assembled conditionally from
/// the market condition, query focus, and user level.
pub fn dynamic_prompt(
    request: &PromptRequest,
    quote: &QuoteSnapshot,
    tone: Tone,
) -> AssembledPrompt {
    let text = format!(
        "You are a financial analysis assistant.\n\n\
         {rules}\n\n\
         {tone}\n\
         Focus the response on {focus}.\n\
         {complexity}\n\n\
         {data}\n\n\
         USER QUERY: {query}\n\n\
         Your analysis:",
        rules = closed_world_rules(),
        tone = tone_clause(tone, request.market_context.condition),
        focus = request.query_focus.label(),
        complexity = complexity_clause(request.user_level),
        data = data_block(request, quote),
        query = request.query,
    );
    AssembledPrompt::Text(text)
}

/// RTFC: four labeled sections - Role, Task, Format, Context. The first
/// three are fixed instruction blocks; Context carries the live data.
pub fn rtfc_prompt(request: &PromptRequest, quote: &QuoteSnapshot) -> AssembledPrompt {
    let system = format!(
        "ROLE:\n\
         You are a senior equity research analyst producing desk notes for \
         clients. You present only verifiable figures.\n\n\
         TASK:\n\
         Answer the client's query about the given stock using only the data \
         in the CONTEXT section. {rules}\n\n\
         FORMAT:\n\
         Respond with three sections: SNAPSHOT (bulleted figures), ANALYSIS \
         (2-3 short paragraphs), and BOTTOM LINE (one sentence). Mark any \
         missing figure as \"Data not available\".",
        rules = closed_world_rules(),
    );

    let user = format!(
        "CONTEXT:\n{data}\n\nCLIENT QUERY: {query}",
        data = data_block(request, quote),
        query = request.query,
    );

    AssembledPrompt::Messages(vec![ChatMessage::system(system), ChatMessage::user(user)])
}

/// Render the prompt for a request. One exhaustive match - adding a strategy
/// is a compile-time-checked change.
pub fn assemble(
    request: &PromptRequest,
    quote: &QuoteSnapshot,
    tone: Tone,
) -> AssembledPrompt {
    match request.strategy {
        finch_models::PromptStrategy::OneShot => one_shot_prompt(request, quote),
        finch_models::PromptStrategy::MultiShot => multi_shot_prompt(request, quote),
        finch_models::PromptStrategy::ChainOfThought => chain_of_thought_prompt(request, quote),
        finch_models::PromptStrategy::Dynamic => dynamic_prompt(request, quote, tone),
        finch_models::PromptStrategy::Rtfc => rtfc_prompt(request, quote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finch_models::{MarketContext, PromptStrategy, QueryFocus};
    use rust_decimal_macros::dec;

    fn full_quote() -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: "RELIANCE".to_string(),
            current_price: Some(dec!(2450)),
            week52_high: Some(dec!(2800)),
            week52_low: Some(dec!(2100)),
            pe_ratio: Some(dec!(27.4)),
            market_cap: Some(16_500_000_000_000),
            recent_pct_change: Some(dec!(-0.45)),
        }
    }

    fn request(strategy: PromptStrategy) -> PromptRequest {
        PromptRequest {
            strategy,
            symbol: "RELIANCE".to_string(),
            query: "Should I invest?".to_string(),
            market_context: MarketContext {
                price_position_pct: Some(dec!(50)),
                condition: MarketCondition::MidRange,
                recent_pct_change: Some(dec!(-0.45)),
            },
            query_focus: QueryFocus::Recommendation,
            user_level: UserLevel::General,
        }
    }

    #[test]
    fn every_strategy_includes_live_price_verbatim() {
        let quote = full_quote();
        for strategy in PromptStrategy::ALL {
            let prompt = assemble(&request(strategy), &quote, Tone::Balanced);
            let text = prompt.flattened();
            assert!(text.contains("2450"), "missing price in {strategy:?}");
            assert!(text.contains("2800"), "missing high in {strategy:?}");
            assert!(text.contains("2100"), "missing low in {strategy:?}");
            assert!(
                text.contains("Should I invest?"),
                "missing query in {strategy:?}"
            );
        }
    }

    #[test]
    fn missing_fields_render_as_not_available() {
        let quote = QuoteSnapshot {
            symbol: "INFY".to_string(),
            current_price: Some(dec!(1500)),
            week52_high: None,
            week52_low: None,
            pe_ratio: None,
            market_cap: None,
            recent_pct_change: None,
        };
        let mut req = request(PromptStrategy::OneShot);
        req.market_context = MarketContext {
            price_position_pct: None,
            condition: MarketCondition::Unknown,
            recent_pct_change: None,
        };

        let text = one_shot_prompt(&req, &quote).flattened();
        assert!(text.contains("52-Week High: N/A"));
        assert!(text.contains("P/E Ratio: N/A"));
        assert!(text.contains("Recent Change: N/A"));
        // The live price that IS present still appears.
        assert!(text.contains("1500"));
    }

    #[test]
    fn one_shot_contains_single_worked_example() {
        let text = one_shot_prompt(&request(PromptStrategy::OneShot), &full_quote()).flattened();
        assert!(text.contains("EXAMPLE ANALYSIS"));
        assert!(text.contains("ACME"));
        assert!(text.contains("Now analyze"));
    }

    #[test]
    fn multi_shot_spans_three_tones() {
        let text =
            multi_shot_prompt(&request(PromptStrategy::MultiShot), &full_quote()).flattened();
        assert!(text.contains("BULLISH"));
        assert!(text.contains("BEARISH"));
        assert!(text.contains("NEUTRAL"));
        assert!(text.contains("EXAMPLE 3"));
    }

    #[test]
    fn chain_of_thought_separates_instruction_from_data() {
        let prompt =
            chain_of_thought_prompt(&request(PromptStrategy::ChainOfThought), &full_quote());
        let system = prompt.system_text().unwrap();
        let user = prompt.user_text();

        for step in ["STEP 1", "STEP 2", "STEP 3", "STEP 4", "STEP 5"] {
            assert!(system.contains(step), "missing {step}");
        }
        assert!(system.contains("CONCLUSION"));
        assert!(user.contains("2450"));
        assert!(!system.contains("2450"));
    }

    #[test]
    fn rtfc_has_four_labeled_sections() {
        let prompt = rtfc_prompt(&request(PromptStrategy::Rtfc), &full_quote());
        let system = prompt.system_text().unwrap();
        let user = prompt.user_text();

        assert!(system.contains("ROLE:"));
        assert!(system.contains("TASK:"));
        assert!(system.contains("FORMAT:"));
        assert!(user.contains("CONTEXT:"));
        assert!(user.contains("2450"));
    }

    #[test]
    fn dynamic_tone_follows_condition() {
        let quote = full_quote();
        let mut req = request(PromptStrategy::Dynamic);
        req.market_context.condition = MarketCondition::NearHigh;

        let cautious = dynamic_prompt(&req, &quote, Tone::Cautious).flattened();
        assert!(cautious.contains("CAUTIOUS"));
        assert!(cautious.contains("near 52-week high"));

        req.market_context.condition = MarketCondition::NearLow;
        let opportunistic = dynamic_prompt(&req, &quote, Tone::Opportunistic).flattened();
        assert!(opportunistic.contains("OPPORTUNISTIC"));
    }

    #[test]
    fn dynamic_complexity_follows_user_level() {
        let quote = full_quote();
        let mut req = request(PromptStrategy::Dynamic);

        req.user_level = UserLevel::Beginner;
        let beginner = dynamic_prompt(&req, &quote, Tone::Balanced).flattened();
        assert!(beginner.contains("plain language"));

        req.user_level = UserLevel::Advanced;
        let advanced = dynamic_prompt(&req, &quote, Tone::Balanced).flattened();
        assert!(advanced.contains("professional terminology"));
    }

    #[test]
    fn all_templates_carry_closed_world_rules() {
        let quote = full_quote();
        for strategy in PromptStrategy::ALL {
            let text = assemble(&request(strategy), &quote, Tone::Balanced).flattened();
            assert!(
                text.contains("NEVER invent"),
                "missing closed-world rules in {strategy:?}"
            );
        }
    }
}
