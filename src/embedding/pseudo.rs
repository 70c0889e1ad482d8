// Deterministic hash-derived embeddings for development and tests
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::client::EmbeddingClient;
use crate::errors::Result;

/// Pseudo-embedding: SHA-256 digest bytes scaled to `[0, 1]`, tiled to size.
///
/// Identical text always yields an identical vector; there is no semantic
/// signal beyond exact equality.
#[derive(Debug, Clone)]
pub struct PseudoEmbedding {
    dimension: usize,
}

impl PseudoEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Embed a single text synchronously
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        if text.is_empty() {
            return vec![0.0; self.dimension];
        }

        let digest = Sha256::digest(text.as_bytes());
        let base: Vec<f32> = digest.iter().map(|&b| b as f32 / 255.0).collect();
        (0..self.dimension).map(|i| base[i % base.len()]).collect()
    }
}

#[async_trait]
impl EmbeddingClient for PseudoEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "pseudo"
    }
}
