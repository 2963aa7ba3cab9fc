//! Judge scoring of model output against a test case.
//!
//! The judge model is asked to return one JSON object scoring five fixed
//! criteria 1-5. Judge models wrap that JSON in prose, so extraction is
//! deliberately permissive: take the substring between the first `{` and
//! the last `}`. No braces means the case fails, never a guessed score.

use std::sync::Arc;

use finch_models::{SamplingParams, TestCase, TokenUsage, Verdict, PASS_THRESHOLD};
use tracing::debug;

use crate::error::EngineError;
use crate::provider::ModelProvider;

/// Low temperature for verdict stability. One call, one verdict; the scorer
/// has no retry or averaging logic of its own.
fn judge_sampling_params() -> SamplingParams {
    SamplingParams::new(0.1, 0.8, 40, 1500)
}

/// Extract the first-`{`-to-last-`}` substring. Permissive on purpose.
pub fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn render_criteria_list(case: &TestCase) -> String {
    case.expected_criteria
        .keys()
        .map(|name| format!("  - {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed judge-instruction template. Embeds the case and the candidate text
/// in one interpolation pass.
pub fn render_judge_prompt(case: &TestCase, candidate: &str) -> String {
    format!(
        "You are a strict evaluation judge for financial analysis responses.\n\n\
         TEST CASE:\n\
         - Symbol: {symbol}\n\
         - User query: {query}\n\
         - Scenario: {scenario}\n\
         - Expected output: {expected}\n\n\
         CANDIDATE RESPONSE TO EVALUATE:\n\
         ---\n\
         {candidate}\n\
         ---\n\n\
         Score the candidate on each criterion from 1 (poor) to 5 (excellent):\n\
         1. accuracy_financial_data: figures match the data the candidate was given, nothing invented\n\
         2. completeness_analysis: covers the aspects the query asked about\n\
         3. clarity_formatting: readable structure, clear numbers\n\
         4. relevance_to_query: answers what was actually asked\n\
         5. structured_output_usage: uses sections/bullets where they help\n\n\
         Also validate each named criterion below with YES or NO:\n\
         {criteria}\n\n\
         Respond with ONLY a JSON object in exactly this format:\n\
         {{\n\
           \"accuracy_financial_data\": <1-5>,\n\
           \"completeness_analysis\": <1-5>,\n\
           \"clarity_formatting\": <1-5>,\n\
           \"relevance_to_query\": <1-5>,\n\
           \"structured_output_usage\": <1-5>,\n\
           \"criteria_validation\": {{\"<criterion>\": \"YES|NO\"}},\n\
           \"total_score\": <sum, 5-25>,\n\
           \"pass_fail\": \"<PASS if total_score >= {threshold} else FAIL>\",\n\
           \"justification\": \"<one or two sentences>\"\n\
         }}",
        symbol = case.symbol,
        query = case.query,
        scenario = case.scenario,
        expected = case.expected_output,
        candidate = candidate,
        criteria = render_criteria_list(case),
        threshold = PASS_THRESHOLD,
    )
}

/// Parse a raw judge response into a `Verdict`.
pub fn parse_verdict(raw: &str) -> Result<Verdict, EngineError> {
    let span = extract_json_span(raw).ok_or_else(|| {
        EngineError::JudgeParse("no balanced JSON object in judge output".to_string())
    })?;
    let verdict: Verdict = serde_json::from_str(span)
        .map_err(|e| EngineError::JudgeParse(format!("judge JSON invalid: {e}")))?;
    Ok(verdict)
}

/// A parsed verdict plus whatever token accounting the judge transport
/// reported for the call.
#[derive(Debug, Clone)]
pub struct JudgeOutcome {
    pub verdict: Verdict,
    pub token_usage: Option<TokenUsage>,
}

pub struct JudgeScorer {
    provider: Arc<dyn ModelProvider>,
}

impl JudgeScorer {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Score one candidate response. Any provider or parse error is fatal
    /// for this case only.
    pub async fn score(&self, case: &TestCase, candidate: &str) -> Result<JudgeOutcome, EngineError> {
        let prompt = render_judge_prompt(case, candidate);
        debug!(test_id = %case.id, "Invoking judge");

        let output = self
            .provider
            .generate(None, &prompt, &judge_sampling_params())
            .await?;

        Ok(JudgeOutcome {
            verdict: parse_verdict(&output.text)?,
            token_usage: output.token_usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedProvider;
    use finch_models::PromptStrategy;
    use std::collections::BTreeMap;

    fn case() -> TestCase {
        TestCase {
            id: "test_001".to_string(),
            symbol: "INFY".to_string(),
            query: "Detailed analysis of Infosys".to_string(),
            strategy: PromptStrategy::ChainOfThought,
            expected_output: "Step-by-step analysis with price and range data".to_string(),
            expected_criteria: BTreeMap::from([
                ("accuracy_of_financial_data".to_string(), true),
                ("step_by_step_reasoning".to_string(), true),
            ]),
            scenario: "Detailed stock analysis".to_string(),
            user_level: None,
        }
    }

    fn verdict_json(total: u8) -> String {
        format!(
            r#"{{
                "accuracy_financial_data": 4,
                "completeness_analysis": 4,
                "clarity_formatting": 4,
                "relevance_to_query": 3,
                "structured_output_usage": 3,
                "criteria_validation": {{"accuracy_of_financial_data": "YES"}},
                "total_score": {total},
                "pass_fail": "PASS",
                "justification": "Covers the figures provided."
            }}"#
        )
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let raw = format!("Here is my evaluation: {} Hope that helps!", verdict_json(18));
        let verdict = parse_verdict(&raw).unwrap();
        assert_eq!(verdict.total_score, 18);
        assert!(verdict.passed());
    }

    #[test]
    fn no_braces_is_parse_error() {
        let err = parse_verdict("I cannot evaluate this response.").unwrap_err();
        assert!(matches!(err, EngineError::JudgeParse(_)));
    }

    #[test]
    fn reversed_braces_are_rejected() {
        assert!(extract_json_span("} nothing here {").is_none());
        assert!(extract_json_span("no braces at all").is_none());
    }

    #[test]
    fn malformed_json_between_braces_is_parse_error() {
        let err = parse_verdict("verdict: {not json}").unwrap_err();
        assert!(matches!(err, EngineError::JudgeParse(_)));
    }

    #[test]
    fn nested_braces_take_outermost_span() {
        let raw = format!("prefix {} suffix", verdict_json(20));
        let span = extract_json_span(&raw).unwrap();
        assert!(span.starts_with('{'));
        assert!(span.ends_with('}'));
        // The nested criteria_validation object stays inside the span.
        assert!(span.contains("criteria_validation"));
    }

    #[test]
    fn judge_prompt_embeds_case_and_candidate() {
        let prompt = render_judge_prompt(&case(), "INFY trades at 1500.");
        assert!(prompt.contains("INFY"));
        assert!(prompt.contains("Detailed analysis of Infosys"));
        assert!(prompt.contains("INFY trades at 1500."));
        assert!(prompt.contains("step_by_step_reasoning"));
        assert!(prompt.contains("total_score"));
    }

    #[tokio::test]
    async fn scorer_end_to_end_with_scripted_judge() {
        let provider = Arc::new(ScriptedProvider::always_ok(&format!(
            "Evaluation complete. {}",
            verdict_json(18)
        )));
        let scorer = JudgeScorer::new(provider);

        let outcome = scorer.score(&case(), "candidate text").await.unwrap();
        assert_eq!(outcome.verdict.total_score, 18);
        assert_eq!(outcome.verdict.pass_fail, "PASS");
        assert!(outcome.token_usage.is_some());
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::always_fail("judge offline"));
        let scorer = JudgeScorer::new(provider);

        let err = scorer.score(&case(), "candidate").await.unwrap_err();
        assert!(matches!(err, EngineError::Provider(_)));
    }
}
