//! FINCH - Financial Insight & Chat Harness
//!
//! A financial-chat backend core: quote-aware prompt strategies, a
//! model-invocation layer over the Claude CLI, and an LLM-as-judge
//! evaluation harness.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use finch::models::{FinchConfig, PromptStrategy, UserLevel};
//!
//! # #[tokio::main] async fn main() -> anyhow::Result<()> {
//! let config = FinchConfig::default();
//! let analyzer = finch::build_analyzer(&config);
//! let analysis = analyzer
//!     .analyze(PromptStrategy::OneShot, "RELIANCE", "How is it doing?", UserLevel::General)
//!     .await?;
//! println!("{}", analysis.result);
//! # Ok(())
//! # }
//! ```

pub use finch_engine as engine;
pub use finch_models as models;
pub use finch_store as store;

use std::sync::Arc;
use std::time::Duration;

use finch_engine::{
    Analyzer, Assistant, CliModelProvider, DemoQuoteProvider, EvaluationHarness, JudgeScorer,
    ModelInvoker,
};
use finch_models::FinchConfig;
use finch_store::{ConversationStore, ResponseCache};

/// Build the analysis pipeline from configuration.
///
/// Quotes come from the bundled demo provider; swap in another
/// `QuoteProvider` via `Analyzer::new` for live data.
pub fn build_analyzer(config: &FinchConfig) -> Analyzer {
    let provider = Arc::new(CliModelProvider::with_model(
        &config.model.analysis_model,
        Duration::from_secs(config.model.timeout_seconds),
    ));
    let cache = ResponseCache::new(
        config.store.cache_max_capacity,
        Duration::from_secs(config.store.cache_ttl_seconds),
    );

    Analyzer::new(
        Arc::new(DemoQuoteProvider::new()),
        ModelInvoker::new(provider),
        cache,
    )
}

/// Build the chat assistant, opening the SQLite conversation store.
pub fn build_assistant(config: &FinchConfig) -> Result<Assistant, anyhow::Error> {
    if let Some(parent) = std::path::Path::new(&config.store.sqlite_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = Arc::new(ConversationStore::open(&config.store.sqlite_path)?);
    Ok(Assistant::new(store, Arc::new(build_analyzer(config))))
}

/// Build the evaluation harness: the analysis pipeline plus a judge on the
/// configured judge model.
pub fn build_harness(config: &FinchConfig) -> EvaluationHarness {
    let judge_provider = Arc::new(CliModelProvider::with_model(
        &config.model.judge_model,
        Duration::from_secs(config.model.timeout_seconds),
    ));
    EvaluationHarness::new(build_analyzer(config), JudgeScorer::new(judge_provider))
}
