use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::strategy::{PromptStrategy, UserLevel};

/// Minimum judge total for a passing case (out of 25).
pub const PASS_THRESHOLD: u8 = 15;

/// Per-token cost constant used for the pipeline cost estimate.
pub const COST_PER_TOKEN_USD: f64 = 0.000002;

/// One hand-authored entry in the fixed evaluation dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub id: String,
    pub symbol: String,
    pub query: String,
    pub strategy: PromptStrategy,
    /// Prose description of what a good answer looks like, shown to the judge.
    pub expected_output: String,
    /// Named criteria the judge must validate YES/NO.
    pub expected_criteria: BTreeMap<String, bool>,
    pub scenario: String,
    pub user_level: Option<UserLevel>,
}

/// Parsed judge verdict. Field names match the JSON format the judge is
/// instructed to emit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub accuracy_financial_data: u8,
    pub completeness_analysis: u8,
    pub clarity_formatting: u8,
    pub relevance_to_query: u8,
    pub structured_output_usage: u8,
    /// YES/NO per named criterion from the test case.
    #[serde(default)]
    pub criteria_validation: BTreeMap<String, String>,
    pub total_score: u8,
    pub pass_fail: String,
    pub justification: String,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.total_score >= PASS_THRESHOLD
    }
}

/// Terminal state of a single harness case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    ModelFailed,
    JudgeFailed,
    Completed,
}

/// Per-case record in the detailed results section of the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseOutcome {
    pub test_id: String,
    pub status: CaseStatus,
    pub strategy: PromptStrategy,
    pub model_output: Option<String>,
    pub evaluation: Option<Verdict>,
    /// Stage the case reached: "model_execution", "judge_evaluation",
    /// or "completed".
    pub pipeline_stage: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreDistribution {
    pub min: u8,
    pub max: u8,
    pub scores: Vec<u8>,
}

/// Aggregated statistics over one harness run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryReport {
    pub total_tests: usize,
    pub completed_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// passed / total * 100.
    pub success_rate: f64,
    /// Mean total_score over COMPLETED cases only.
    pub average_score: f64,
    pub score_distribution: ScoreDistribution,
    /// Mean total_score per strategy endpoint, COMPLETED cases only.
    pub per_strategy_average: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineInfo {
    pub timestamp: String,
    pub total_test_cases: usize,
    pub methods_tested: Vec<String>,
    pub pass_threshold: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineTokenUsage {
    pub total_pipeline_tokens: u64,
    pub estimated_cost: String,
}

/// The persisted evaluation report (JSON schema is the external contract).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub pipeline_info: PipelineInfo,
    pub token_usage: PipelineTokenUsage,
    pub summary: SummaryReport,
    pub detailed_results: Vec<CaseOutcome>,
}
