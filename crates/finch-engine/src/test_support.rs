//! Test support: scripted model providers.
//!
//! `ScriptedProvider` replays a fixed sequence of outcomes so retry logic,
//! the evaluation harness, and the chat layer can be exercised without a
//! live model. Kept in the library (not `#[cfg(test)]`) so integration
//! tests can use it too.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use finch_models::{SamplingParams, TokenUsage};

use crate::error::EngineError;
use crate::provider::{GenerateOutput, ModelProvider};

type Outcome = Result<String, String>;

pub struct ScriptedProvider {
    script: Mutex<VecDeque<Outcome>>,
    repeat: Option<Outcome>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Every call succeeds with the same text.
    pub fn always_ok(text: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(Ok(text.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with the same error message.
    pub fn always_fail(message: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(Err(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// The first `failures` calls fail, then every call succeeds.
    pub fn fail_then_ok(failures: usize, text: &str) -> Self {
        let script = (0..failures)
            .map(|_| Err("scripted failure".to_string()))
            .collect();
        Self {
            script: Mutex::new(script),
            repeat: Some(Ok(text.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replay outcomes in order; calls past the end of the script fail.
    pub fn from_script(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total calls made against this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Outcome {
        let mut script = match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(outcome) = script.pop_front() {
            return outcome;
        }
        match &self.repeat {
            Some(outcome) => outcome.clone(),
            None => Err("script exhausted".to_string()),
        }
    }
}

/// Records every prompt it receives and answers with fixed text. Used to
/// assert on the assembled prompt that actually reached the transport.
pub struct RecordingProvider {
    reply: String,
    prompts: Mutex<Vec<(Option<String>, String)>>,
}

impl RecordingProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All `(system, user)` prompt pairs seen so far.
    pub fn prompts(&self) -> Vec<(Option<String>, String)> {
        match self.prompts.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ModelProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        _params: &SamplingParams,
    ) -> Result<GenerateOutput, EngineError> {
        let mut prompts = match self.prompts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        prompts.push((
            system_prompt.map(|s| s.to_string()),
            user_prompt.to_string(),
        ));
        Ok(GenerateOutput {
            text: self.reply.clone(),
            token_usage: Some(TokenUsage::new(100, 50)),
        })
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _system_prompt: Option<&str>,
        _user_prompt: &str,
        _params: &SamplingParams,
    ) -> Result<GenerateOutput, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_outcome() {
            Ok(text) => Ok(GenerateOutput {
                text,
                token_usage: Some(TokenUsage::new(100, 50)),
            }),
            Err(message) => Err(EngineError::Provider(message)),
        }
    }
}
