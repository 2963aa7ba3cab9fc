use std::time::Duration;

use async_trait::async_trait;
use finch_models::{SamplingParams, TokenUsage};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Raw output of a single model call.
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    pub text: String,
    /// Reported by the transport when it reports one. Never synthesized:
    /// a transport that does not count tokens yields `None` here.
    pub token_usage: Option<TokenUsage>,
}

/// The seam between the engine and whatever actually runs the model.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        params: &SamplingParams,
    ) -> Result<GenerateOutput, EngineError>;
}

/// Configuration for a `claude` CLI invocation.
#[derive(Debug, Clone)]
pub struct CliProviderConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for CliProviderConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Provider that shells out to the `claude` CLI.
///
/// The CLI exposes no sampling knobs, so temperature and friends are logged
/// for traceability and otherwise unused on this transport. It also reports
/// no token counts in text mode, so `token_usage` is always `None`.
pub struct CliModelProvider {
    config: CliProviderConfig,
}

impl CliModelProvider {
    pub fn new(config: CliProviderConfig) -> Self {
        Self { config }
    }

    pub fn with_model(model: &str, timeout: Duration) -> Self {
        Self {
            config: CliProviderConfig {
                model: model.to_string(),
                timeout,
            },
        }
    }
}

#[async_trait]
impl ModelProvider for CliModelProvider {
    fn name(&self) -> &str {
        "claude-cli"
    }

    async fn generate(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        params: &SamplingParams,
    ) -> Result<GenerateOutput, EngineError> {
        debug!(
            model = %self.config.model,
            temperature = params.temperature,
            top_p = params.top_p,
            top_k = params.top_k,
            "Invoking claude CLI"
        );

        let mut args: Vec<&str> = vec!["-p", user_prompt];
        if let Some(system) = system_prompt {
            args.push("--system-prompt");
            args.push(system);
        }
        args.extend(["--model", &self.config.model, "--output-format", "text"]);

        let result = tokio::time::timeout(self.config.timeout, async {
            Command::new("claude").args(&args).output().await
        })
        .await
        .map_err(|_| EngineError::Timeout(self.config.timeout.as_secs()))?
        .map_err(|e| EngineError::Provider(format!("Failed to spawn claude: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
            return Err(EngineError::Provider(format!(
                "claude exited {}: {}",
                result.status, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&result.stdout).to_string();
        if stdout.trim().is_empty() {
            return Err(EngineError::Provider(
                "claude returned empty response".to_string(),
            ));
        }

        Ok(GenerateOutput {
            text: stdout,
            token_usage: None,
        })
    }
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new("claude").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CliProviderConfig::default();
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
