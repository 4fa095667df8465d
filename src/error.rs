//! Error handling for the matching engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unresolved skill mention: {0}")]
    UnresolvedSkill(String),

    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("embedding provider timed out after {timeout_ms}ms embedding '{context}'")]
    ProviderTimeout { context: String, timeout_ms: u64 },

    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("embedding provider rejected input: {0}")]
    ProviderRejected(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Whether the failure is transient and worth retrying per the backoff
    /// policy. Only provider-side availability problems qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::ProviderUnavailable(_))
    }
}
