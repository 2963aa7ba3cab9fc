use serde::{Deserialize, Serialize};

/// Top-level configuration for FINCH.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FinchConfig {
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub eval: EvalConfig,
}

/// Configuration for the conversation store and response cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite conversation database. ":memory:" for ephemeral.
    pub sqlite_path: String,
    /// Maximum number of entries in the in-memory response cache.
    pub cache_max_capacity: u64,
    /// Default TTL in seconds for cached quote/response entries.
    pub cache_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/finch.db".to_string(),
            cache_max_capacity: 10_000,
            cache_ttl_seconds: 60,
        }
    }
}

/// Configuration for model provider invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Model used for analysis responses.
    pub analysis_model: String,
    /// Model used by the judge scorer.
    pub judge_model: String,
    /// Caller-side timeout for a single provider call in seconds.
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            analysis_model: "claude-3-5-haiku-latest".to_string(),
            judge_model: "claude-sonnet-4-5-20250929".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Configuration for the evaluation harness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    /// Where to write the persisted evaluation report JSON.
    pub report_dir: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            report_dir: "reports".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_finch_config() {
        let config = FinchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: FinchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(ModelConfig::default().timeout_seconds, 30);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[store]
sqlite_path = "/tmp/finch_test.db"
cache_max_capacity = 500
cache_ttl_seconds = 30

[model]
analysis_model = "claude-3-5-haiku-latest"
judge_model = "claude-sonnet-4-5-20250929"
timeout_seconds = 20

[eval]
report_dir = "/tmp/reports"
"#;

        let config: FinchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.sqlite_path, "/tmp/finch_test.db");
        assert_eq!(config.model.timeout_seconds, 20);
        assert_eq!(config.eval.report_dir, "/tmp/reports");
    }
}
