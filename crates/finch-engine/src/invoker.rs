//! Retry-bounded model invocation.
//!
//! The invoker turns provider errors into a `ModelResponse` carrying the
//! error message instead of propagating them: callers downstream (the chat
//! layer, the evaluation harness) always get a response object and decide
//! themselves how a failure surfaces.

use std::sync::Arc;

use finch_models::{ModelResponse, SamplingParams};
use tracing::{debug, warn};

use crate::prompts::AssembledPrompt;
use crate::provider::ModelProvider;

pub struct ModelInvoker {
    provider: Arc<dyn ModelProvider>,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Run one model call with at most one retry.
    ///
    /// The retry budget is exactly one: a second failure is final and is
    /// reported in the response, never panicked or retried further.
    pub async fn invoke(&self, prompt: &AssembledPrompt, params: &SamplingParams) -> ModelResponse {
        let system = prompt.system_text();
        let user = prompt.user_text();

        debug!(provider = self.provider.name(), "Invoking model");
        let first = self
            .provider
            .generate(system.as_deref(), &user, params)
            .await;

        let first_err = match first {
            Ok(output) => return ModelResponse::ok(output.text, output.token_usage),
            Err(e) => e,
        };

        warn!(error = %first_err, "Model call failed, retrying once");
        match self
            .provider
            .generate(system.as_deref(), &user, params)
            .await
        {
            Ok(output) => ModelResponse::ok(output.text, output.token_usage),
            Err(retry_err) => {
                warn!(error = %retry_err, "Retry failed, giving up");
                ModelResponse::failed(retry_err.to_string())
            }
        }
    }
}
