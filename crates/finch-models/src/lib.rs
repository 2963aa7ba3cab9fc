pub mod chat;
pub mod config;
pub mod eval;
pub mod quote;
pub mod strategy;

pub use chat::{ChatMessage, ChatRole, ModelResponse, TokenUsage};
pub use config::{EvalConfig, FinchConfig, ModelConfig, StoreConfig};
pub use eval::{
    CaseOutcome, CaseStatus, EvaluationReport, PipelineInfo, PipelineTokenUsage, ScoreDistribution,
    SummaryReport, TestCase, Verdict, COST_PER_TOKEN_USD, PASS_THRESHOLD,
};
pub use quote::{MarketCondition, MarketContext, QuoteSnapshot};
pub use strategy::{PromptRequest, PromptStrategy, QueryFocus, SamplingParams, Tone, UserLevel};
