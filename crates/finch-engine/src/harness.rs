//! Sequential evaluation harness.
//!
//! Each case walks PENDING -> MODEL_CALLED -> {MODEL_FAILED | JUDGED ->
//! {JUDGE_FAILED | COMPLETED}}. Terminal states are never retried; a failed
//! case is recorded and the run moves on. Cases run sequentially since
//! judge scoring is rate-sensitive.

use std::collections::BTreeMap;

use finch_models::{
    CaseOutcome, CaseStatus, EvaluationReport, PipelineInfo, PipelineTokenUsage,
    ScoreDistribution, SummaryReport, TestCase, UserLevel, COST_PER_TOKEN_USD, PASS_THRESHOLD,
};
use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::judge::JudgeScorer;

pub struct EvaluationHarness {
    analyzer: Analyzer,
    judge: JudgeScorer,
}

impl EvaluationHarness {
    pub fn new(analyzer: Analyzer, judge: JudgeScorer) -> Self {
        Self { analyzer, judge }
    }

    /// Run every case in listed order and aggregate the report.
    pub async fn run(&self, cases: &[TestCase]) -> EvaluationReport {
        let mut outcomes: Vec<CaseOutcome> = Vec::with_capacity(cases.len());
        let mut total_tokens: u64 = 0;

        for case in cases {
            info!(test_id = %case.id, strategy = %case.strategy.endpoint(), "Running case");
            let outcome = self.run_case(case, &mut total_tokens).await;
            info!(test_id = %case.id, status = ?outcome.status, "Case finished");
            outcomes.push(outcome);
        }

        let summary = summarize(cases.len(), &outcomes);
        let methods_tested = unique_endpoints(cases);

        EvaluationReport {
            pipeline_info: PipelineInfo {
                timestamp: chrono::Utc::now().to_rfc3339(),
                total_test_cases: cases.len(),
                methods_tested,
                pass_threshold: format!("{PASS_THRESHOLD}/25"),
            },
            token_usage: PipelineTokenUsage {
                total_pipeline_tokens: total_tokens,
                estimated_cost: format!("${:.6}", total_tokens as f64 * COST_PER_TOKEN_USD),
            },
            summary,
            detailed_results: outcomes,
        }
    }

    async fn run_case(&self, case: &TestCase, total_tokens: &mut u64) -> CaseOutcome {
        let user_level = case.user_level.unwrap_or(UserLevel::General);

        let response = match self
            .analyzer
            .respond(case.strategy, &case.symbol, &case.query, user_level)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(test_id = %case.id, error = %e, "Model stage errored");
                return model_failed(case, e.to_string());
            }
        };

        if let Some(usage) = response.token_usage {
            *total_tokens += usage.total_tokens;
        }

        if !response.is_ok() {
            let error = response.error.unwrap_or_else(|| "model call failed".to_string());
            warn!(test_id = %case.id, error = %error, "Model stage failed");
            return model_failed(case, error);
        }

        match self.judge.score(case, &response.text).await {
            Ok(outcome) => {
                if let Some(usage) = outcome.token_usage {
                    *total_tokens += usage.total_tokens;
                }
                CaseOutcome {
                    test_id: case.id.clone(),
                    status: CaseStatus::Completed,
                    strategy: case.strategy,
                    model_output: Some(response.text),
                    evaluation: Some(outcome.verdict),
                    pipeline_stage: "completed".to_string(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(test_id = %case.id, error = %e, "Judge stage failed");
                CaseOutcome {
                    test_id: case.id.clone(),
                    status: CaseStatus::JudgeFailed,
                    strategy: case.strategy,
                    model_output: Some(response.text),
                    evaluation: None,
                    pipeline_stage: "judge_evaluation".to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn model_failed(case: &TestCase, error: String) -> CaseOutcome {
    CaseOutcome {
        test_id: case.id.clone(),
        status: CaseStatus::ModelFailed,
        strategy: case.strategy,
        model_output: None,
        evaluation: None,
        pipeline_stage: "model_execution".to_string(),
        error: Some(error),
    }
}

fn unique_endpoints(cases: &[TestCase]) -> Vec<String> {
    let mut seen = Vec::new();
    for case in cases {
        let endpoint = case.strategy.endpoint().to_string();
        if !seen.contains(&endpoint) {
            seen.push(endpoint);
        }
    }
    seen
}

/// Aggregation rules: only COMPLETED cases count toward pass/fail and the
/// score distribution; MODEL_FAILED/JUDGE_FAILED remain in the total.
fn summarize(total_tests: usize, outcomes: &[CaseOutcome]) -> SummaryReport {
    let completed: Vec<&CaseOutcome> = outcomes
        .iter()
        .filter(|o| o.status == CaseStatus::Completed)
        .collect();

    let scores: Vec<u8> = completed
        .iter()
        .filter_map(|o| o.evaluation.as_ref().map(|v| v.total_score))
        .collect();

    let passed_tests = completed
        .iter()
        .filter(|o| o.evaluation.as_ref().is_some_and(|v| v.passed()))
        .count();
    let failed_tests = completed.len() - passed_tests;

    let success_rate = if total_tests > 0 {
        passed_tests as f64 / total_tests as f64 * 100.0
    } else {
        0.0
    };

    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64
    };

    let mut per_strategy: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for outcome in &completed {
        if let Some(verdict) = &outcome.evaluation {
            let entry = per_strategy
                .entry(outcome.strategy.endpoint().to_string())
                .or_insert((0.0, 0));
            entry.0 += verdict.total_score as f64;
            entry.1 += 1;
        }
    }
    let per_strategy_average: BTreeMap<String, f64> = per_strategy
        .into_iter()
        .map(|(endpoint, (sum, count))| (endpoint, sum / count as f64))
        .collect();

    SummaryReport {
        total_tests,
        completed_tests: completed.len(),
        passed_tests,
        failed_tests,
        success_rate,
        average_score,
        score_distribution: ScoreDistribution {
            min: scores.iter().copied().min().unwrap_or(0),
            max: scores.iter().copied().max().unwrap_or(0),
            scores,
        },
        per_strategy_average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::invoker::ModelInvoker;
    use crate::quotes::DemoQuoteProvider;
    use crate::test_support::ScriptedProvider;
    use finch_models::{PromptStrategy, Verdict};
    use finch_store::ResponseCache;
    use std::sync::Arc;
    use std::time::Duration;

    fn verdict(total: u8) -> Verdict {
        Verdict {
            accuracy_financial_data: 4,
            completeness_analysis: 4,
            clarity_formatting: 4,
            relevance_to_query: 3,
            structured_output_usage: 3,
            criteria_validation: BTreeMap::new(),
            total_score: total,
            pass_fail: if total >= PASS_THRESHOLD {
                "PASS".to_string()
            } else {
                "FAIL".to_string()
            },
            justification: "scripted".to_string(),
        }
    }

    fn completed_outcome(id: &str, strategy: PromptStrategy, total: u8) -> CaseOutcome {
        CaseOutcome {
            test_id: id.to_string(),
            status: CaseStatus::Completed,
            strategy,
            model_output: Some("output".to_string()),
            evaluation: Some(verdict(total)),
            pipeline_stage: "completed".to_string(),
            error: None,
        }
    }

    fn harness(model: Arc<ScriptedProvider>, judge: Arc<ScriptedProvider>) -> EvaluationHarness {
        let analyzer = Analyzer::new(
            Arc::new(DemoQuoteProvider::new()),
            ModelInvoker::new(model),
            ResponseCache::new(100, Duration::from_secs(60)),
        );
        EvaluationHarness::new(analyzer, JudgeScorer::new(judge))
    }

    fn judge_json(total: u8) -> String {
        format!(
            r#"Verdict: {{
                "accuracy_financial_data": 4,
                "completeness_analysis": 4,
                "clarity_formatting": 4,
                "relevance_to_query": 3,
                "structured_output_usage": 3,
                "total_score": {total},
                "pass_fail": "PASS",
                "justification": "scripted"
            }}"#
        )
    }

    fn case(id: &str, strategy: PromptStrategy) -> TestCase {
        TestCase {
            id: id.to_string(),
            symbol: "RELIANCE".to_string(),
            query: "How is it doing?".to_string(),
            strategy,
            expected_output: "analysis".to_string(),
            expected_criteria: BTreeMap::new(),
            scenario: "test".to_string(),
            user_level: None,
        }
    }

    #[tokio::test]
    async fn all_cases_complete_and_pass() {
        let harness = harness(
            Arc::new(ScriptedProvider::always_ok("Analysis text.")),
            Arc::new(ScriptedProvider::always_ok(&judge_json(18))),
        );
        let cases = vec![
            case("t1", PromptStrategy::OneShot),
            case("t2", PromptStrategy::Dynamic),
        ];

        let report = harness.run(&cases).await;
        assert_eq!(report.summary.total_tests, 2);
        assert_eq!(report.summary.completed_tests, 2);
        assert_eq!(report.summary.passed_tests, 2);
        assert_eq!(report.summary.success_rate, 100.0);
        assert_eq!(report.summary.average_score, 18.0);
        assert_eq!(report.summary.score_distribution.scores, vec![18, 18]);
        // Two model calls and two judge calls, 150 scripted tokens each.
        assert_eq!(report.token_usage.total_pipeline_tokens, 600);
        assert_eq!(report.pipeline_info.pass_threshold, "15/25");
    }

    #[tokio::test]
    async fn model_failure_skips_judge_and_run_continues() {
        // First case: model fails twice (attempt + retry). Second case: ok.
        let model = Arc::new(ScriptedProvider::fail_then_ok(2, "Analysis text."));
        let judge = Arc::new(ScriptedProvider::always_ok(&judge_json(20)));
        let harness = harness(model, judge.clone());

        let cases = vec![
            case("t1", PromptStrategy::OneShot),
            case("t2", PromptStrategy::MultiShot),
        ];
        let report = harness.run(&cases).await;

        let first = &report.detailed_results[0];
        assert_eq!(first.status, CaseStatus::ModelFailed);
        assert_eq!(first.pipeline_stage, "model_execution");
        assert!(first.evaluation.is_none());

        let second = &report.detailed_results[1];
        assert_eq!(second.status, CaseStatus::Completed);

        // The judge only ran for the second case.
        assert_eq!(judge.calls(), 1);
        assert_eq!(report.summary.total_tests, 2);
        assert_eq!(report.summary.completed_tests, 1);
        assert_eq!(report.summary.success_rate, 50.0);
        // Distribution excludes the failed case.
        assert_eq!(report.summary.score_distribution.scores, vec![20]);
    }

    #[tokio::test]
    async fn unparseable_judge_output_is_judge_failed() {
        let harness = harness(
            Arc::new(ScriptedProvider::always_ok("Analysis text.")),
            Arc::new(ScriptedProvider::always_ok("I refuse to emit JSON.")),
        );

        let report = harness.run(&[case("t1", PromptStrategy::Rtfc)]).await;
        let outcome = &report.detailed_results[0];
        assert_eq!(outcome.status, CaseStatus::JudgeFailed);
        assert_eq!(outcome.pipeline_stage, "judge_evaluation");
        assert!(outcome.model_output.is_some());
        assert_eq!(report.summary.completed_tests, 0);
        assert_eq!(report.summary.average_score, 0.0);
    }

    #[tokio::test]
    async fn two_runs_on_deterministic_stubs_agree() {
        let cases = vec![
            case("t1", PromptStrategy::OneShot),
            case("t2", PromptStrategy::Dynamic),
            case("t3", PromptStrategy::ChainOfThought),
        ];

        let mut rates = Vec::new();
        let mut averages = Vec::new();
        for _ in 0..2 {
            let harness = harness(
                Arc::new(ScriptedProvider::always_ok("Analysis text.")),
                Arc::new(ScriptedProvider::always_ok(&judge_json(17))),
            );
            let report = harness.run(&cases).await;
            rates.push(report.summary.success_rate);
            averages.push(report.summary.average_score);
        }

        assert_eq!(rates[0], rates[1]);
        assert_eq!(averages[0], averages[1]);
    }

    #[test]
    fn per_strategy_average_groups_completed_cases() {
        let outcomes = vec![
            completed_outcome("t1", PromptStrategy::OneShot, 16),
            completed_outcome("t2", PromptStrategy::OneShot, 20),
            completed_outcome("t3", PromptStrategy::Dynamic, 25),
        ];
        let summary = summarize(3, &outcomes);

        assert_eq!(summary.per_strategy_average["one-shot-analysis"], 18.0);
        assert_eq!(summary.per_strategy_average["dynamic-analysis"], 25.0);
        assert_eq!(summary.score_distribution.min, 16);
        assert_eq!(summary.score_distribution.max, 25);
    }

    #[test]
    fn empty_run_yields_zeroed_summary() {
        let summary = summarize(0, &[]);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.per_strategy_average.is_empty());
    }
}
