use serde::{Deserialize, Serialize};

/// Role tag for a conversation or prompt segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One role-tagged segment of a structured prompt or stored conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Token accounting reported by the provider. Only populated from the
/// provider's own metadata, never estimated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Result of one model invocation. A failed call carries an error message
/// and empty text - callers never see partial streamed output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    pub token_usage: Option<TokenUsage>,
    pub error: Option<String>,
}

impl ModelResponse {
    pub fn ok(text: String, token_usage: Option<TokenUsage>) -> Self {
        Self {
            text,
            token_usage,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            token_usage: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_model_response() {
        let response = ModelResponse::ok(
            "RELIANCE is trading mid-range.".to_string(),
            Some(TokenUsage::new(120, 80)),
        );
        let json = serde_json::to_string(&response).unwrap();
        let deserialized: ModelResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, deserialized);
        assert_eq!(deserialized.token_usage.unwrap().total_tokens, 200);
    }

    #[test]
    fn failed_response_has_empty_text() {
        let response = ModelResponse::failed("provider timeout");
        assert!(!response.is_ok());
        assert!(response.text.is_empty());
        assert!(response.token_usage.is_none());
    }

    #[test]
    fn role_serialization() {
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&ChatRole::Model).unwrap(),
            "\"model\""
        );
    }
}
