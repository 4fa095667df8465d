//! Deterministic token-hashing embedder
//!
//! Stands in for a network embedding provider in tests and the CLI demo.
//! Each token hashes to a stable pseudo-random direction; a text embeds as
//! the normalized sum of its token directions, so texts sharing tokens land
//! near each other under cosine distance.

use crate::embedding::provider::{EmbeddingProvider, ProviderError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn token_direction(&self, token: &str) -> Vec<f32> {
        let mut direction = Vec::with_capacity(self.dimension);
        let mut counter: u32 = 0;
        while direction.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            hasher.update(counter.to_le_bytes());
            let digest = hasher.finalize();
            for byte in digest.iter() {
                if direction.len() == self.dimension {
                    break;
                }
                // Map each byte to [-1, 1].
                direction.push(*byte as f32 / 127.5 - 1.0);
            }
            counter += 1;
        }
        direction
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::MalformedInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let mut accumulated = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;
        for token in Self::tokenize(text) {
            for (slot, component) in accumulated
                .iter_mut()
                .zip(self.token_direction(&token).iter())
            {
                *slot += component;
            }
            tokens += 1;
        }
        if tokens == 0 {
            return Err(ProviderError::MalformedInput(
                "no embeddable tokens".to_string(),
            ));
        }

        let norm = accumulated.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for slot in accumulated.iter_mut() {
                *slot /= norm;
            }
        }
        Ok(accumulated)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn version(&self) -> &str {
        "hash-embedder-1"
    }
}
