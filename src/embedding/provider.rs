//! External embedding provider contract

use crate::error::{EngineError, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure modes of a provider call, classified for the retry policy.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_) | ProviderError::Unavailable(_)
        )
    }
}

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for identical text within one
/// provider version; the engine keys derived caches on that contract.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;

    /// Output vector length. Fixed per provider version.
    fn dimension(&self) -> usize;

    /// Version token under which determinism holds.
    fn version(&self) -> &str;
}

/// Retry and deadline policy for provider calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Provider wrapper enforcing per-attempt deadlines and capped backoff.
///
/// Rate-limit and unavailability errors retry with exponential backoff up to
/// the attempt cap. A deadline overrun fails the request immediately; the
/// caller caches nothing on any failure path.
#[derive(Clone)]
pub struct ResilientEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    policy: RetryPolicy,
}

impl ResilientEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    pub fn provider_version(&self) -> &str {
        self.inner.version()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut backoff = self.policy.base_backoff;
        let mut last_unavailable = String::new();

        for attempt in 1..=self.policy.max_attempts {
            let call = self.inner.embed(text);
            match tokio::time::timeout(self.policy.timeout, call).await {
                Err(_) => {
                    return Err(EngineError::ProviderTimeout {
                        context: preview(text),
                        timeout_ms: self.policy.timeout.as_millis() as u64,
                    });
                }
                Ok(Ok(vector)) => {
                    if vector.len() != self.inner.dimension() {
                        return Err(EngineError::ProviderRejected(format!(
                            "provider returned {} dimensions, expected {}",
                            vector.len(),
                            self.inner.dimension()
                        )));
                    }
                    return Ok(vector);
                }
                Ok(Err(e)) if e.is_retryable() => {
                    warn!(
                        "embedding attempt {}/{} failed ({}), backing off {:?}",
                        attempt, self.policy.max_attempts, e, backoff
                    );
                    last_unavailable = e.to_string();
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
                Ok(Err(e)) => {
                    debug!("embedding rejected non-retryably: {}", e);
                    return Err(EngineError::ProviderRejected(e.to_string()));
                }
            }
        }

        Err(EngineError::ProviderUnavailable(format!(
            "{} attempts exhausted: {}",
            self.policy.max_attempts, last_unavailable
        )))
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 48;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    }
}
