pub mod analyzer;
pub mod assistant;
pub mod context;
pub mod dataset;
pub mod error;
pub mod harness;
pub mod invoker;
pub mod judge;
pub mod prompts;
pub mod provider;
pub mod quotes;
pub mod selector;

pub mod test_support;

pub use analyzer::{AnalysisResponse, Analyzer};
pub use assistant::{Assistant, ChatMode, ChatReply};
pub use dataset::builtin_test_cases;
pub use error::EngineError;
pub use harness::EvaluationHarness;
pub use invoker::ModelInvoker;
pub use judge::{JudgeOutcome, JudgeScorer};
pub use provider::{CliModelProvider, CliProviderConfig, GenerateOutput, ModelProvider};
pub use quotes::{DemoQuoteProvider, QuoteProvider};
