use serde::{Deserialize, Serialize};

use crate::quote::MarketContext;

/// A named prompting approach. Closed set - callers select a strategy
/// explicitly (one endpoint per variant), never by inference from the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStrategy {
    OneShot,
    MultiShot,
    ChainOfThought,
    Dynamic,
    Rtfc,
}

impl PromptStrategy {
    pub const ALL: [PromptStrategy; 5] = [
        PromptStrategy::OneShot,
        PromptStrategy::MultiShot,
        PromptStrategy::ChainOfThought,
        PromptStrategy::Dynamic,
        PromptStrategy::Rtfc,
    ];

    /// The endpoint/route name this strategy is exposed under.
    pub fn endpoint(&self) -> &'static str {
        match self {
            PromptStrategy::OneShot => "one-shot-analysis",
            PromptStrategy::MultiShot => "multi-shot-analysis",
            PromptStrategy::ChainOfThought => "chain-of-thought-analysis",
            PromptStrategy::Dynamic => "dynamic-analysis",
            PromptStrategy::Rtfc => "rtfc-analysis",
        }
    }
}

/// What the user's question is mostly about, derived by keyword scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryFocus {
    Technical,
    Fundamental,
    Recommendation,
    Comprehensive,
}

impl QueryFocus {
    pub fn label(&self) -> &'static str {
        match self {
            QueryFocus::Technical => "technical analysis",
            QueryFocus::Fundamental => "fundamental analysis",
            QueryFocus::Recommendation => "investment recommendation",
            QueryFocus::Comprehensive => "comprehensive analysis",
        }
    }
}

/// Caller-declared experience level. Shapes vocabulary and depth of the
/// dynamic prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    Beginner,
    #[default]
    General,
    Advanced,
}

impl UserLevel {
    pub fn label(&self) -> &'static str {
        match self {
            UserLevel::Beginner => "beginner",
            UserLevel::General => "general",
            UserLevel::Advanced => "advanced",
        }
    }
}

/// Response tone requested of the model, derived from market condition
/// under the dynamic strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Cautious,
    Opportunistic,
    Balanced,
}

impl Tone {
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Cautious => "cautious",
            Tone::Opportunistic => "opportunistic",
            Tone::Balanced => "balanced",
        }
    }
}

/// Generation controls passed to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub stop_sequences: Vec<String>,
    pub max_output_tokens: u32,
}

impl SamplingParams {
    pub fn new(temperature: f32, top_p: f32, top_k: u32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            top_p,
            top_k,
            stop_sequences: Vec::new(),
            max_output_tokens,
        }
    }
}

/// Fully-resolved input to prompt rendering. Built once per call from its
/// inputs, discarded after use - carries no shared state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptRequest {
    pub strategy: PromptStrategy,
    pub symbol: String,
    pub query: String,
    pub market_context: MarketContext,
    pub query_focus: QueryFocus,
    pub user_level: UserLevel,
}
