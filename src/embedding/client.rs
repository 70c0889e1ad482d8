// Embedding client interface and backend selection
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::embedding::{EmbeddingEngine, PseudoEmbedding};
use crate::errors::Result;

/// Converts text into fixed-dimension vectors.
///
/// Implementations are shared across concurrent requests.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of every produced vector
    fn dimension(&self) -> usize;

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}

/// Build the configured embedding backend.
///
/// Model-backed clients verify their output dimension here, so a
/// misconfigured model fails at startup rather than per request.
pub async fn create_client(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingClient>> {
    let client: Arc<dyn EmbeddingClient> = match config.backend {
        EmbeddingBackend::Pseudo => Arc::new(PseudoEmbedding::new(config.dimension)),
        EmbeddingBackend::Candle => {
            let model_id = config.model_id.clone();
            let dimension = config.dimension;
            let engine = tokio::task::spawn_blocking(move || EmbeddingEngine::load(&model_id, dimension))
                .await
                .map_err(|e| anyhow::anyhow!("embedding model loader panicked: {}", e))??;
            Arc::new(engine)
        }
    };

    info!(
        backend = client.name(),
        dimension = client.dimension(),
        "embedding client ready"
    );
    Ok(client)
}
