// Embedding Engine - local BERT-family embeddings via Candle
use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedding::client::EmbeddingClient;
use crate::errors::RetrievalError;

const DIMENSION_PROBE: &str = "dimension probe";

/// Embedding engine running a sentence-embedding model on CPU
#[derive(Clone)]
pub struct EmbeddingEngine {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    model_id: String,
    dimension: usize,
}

impl EmbeddingEngine {
    /// Download (first use) and load `model_id`, then check its output size.
    ///
    /// Blocking; call from a blocking-capable thread.
    pub fn load(model_id: &str, dimension: usize) -> crate::errors::Result<Self> {
        let device = Device::Cpu;

        let (model, tokenizer) = Self::load_model(model_id, &device).map_err(|e| {
            RetrievalError::ConfigError(format!("Failed to load embedding model {}: {:#}", model_id, e))
        })?;

        let engine = Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            model_id: model_id.to_string(),
            dimension,
        };

        let probe = engine
            .embed_batch(&[DIMENSION_PROBE.to_string()])
            .map_err(|e| RetrievalError::EmbeddingError(format!("{:#}", e)))?;
        let actual = probe.first().map(Vec::len).unwrap_or(0);
        if actual != dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                actual,
            });
        }

        info!(model = model_id, dimension, "loaded embedding model");
        Ok(engine)
    }

    fn load_model(model_id: &str, device: &Device) -> Result<(BertModel, Tokenizer)> {
        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], candle_core::DType::F32, device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config).context("Failed to create BERT model")?;

        Ok((model, tokenizer))
    }

    /// Generate L2-normalized embeddings for a batch (blocking)
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = texts.len();

        // Pad sequences
        let mut padded_ids = vec![0u32; batch_size * max_len];
        let mut padded_mask = vec![0u32; batch_size * max_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let row = i * max_len;
            padded_ids[row..row + ids.len()].copy_from_slice(ids);
            padded_mask[row..row + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(padded_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(padded_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;

        let mut vectors = pooled.to_vec2::<f32>()?;
        for vector in vectors.iter_mut() {
            l2_normalize(vector);
        }

        debug!(batch = batch_size, max_len, "embedded batch");
        Ok(vectors)
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingClient for EmbeddingEngine {
    async fn embed(&self, texts: &[String]) -> crate::errors::Result<Vec<Vec<f32>>> {
        let engine = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || engine.embed_batch(&texts))
            .await
            .map_err(|e| RetrievalError::EmbeddingError(format!("embedding task failed: {}", e)))?
            .map_err(|e| RetrievalError::EmbeddingError(format!("{:#}", e)))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "candle"
    }
}
