use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Quote data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Unknown strategy: {0}")]
    InvalidStrategy(String),

    #[error("Model provider error: {0}")]
    Provider(String),

    #[error("Provider call timed out after {0} seconds")]
    Timeout(u64),

    #[error("Judge verdict parse error: {0}")]
    JudgeParse(String),

    #[error("Store error: {0}")]
    Store(#[from] finch_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
