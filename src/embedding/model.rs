//! Sentence-transformers embedding model using candle.

use super::{Embedding, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::error::{Result, SpanEvalError};
use anyhow::Context;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};

/// On-disk format of a checkpoint's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeightsFormat {
    Safetensors,
    /// PyTorch pickle (`pytorch_model.bin`).
    Pth,
}

impl WeightsFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("safetensors") => WeightsFormat::Safetensors,
            _ => WeightsFormat::Pth,
        }
    }
}

/// Open checkpoint weights with the loader matching their format.
fn load_weights(path: &Path, device: &Device) -> anyhow::Result<VarBuilder<'static>> {
    match WeightsFormat::of(path) {
        WeightsFormat::Safetensors => {
            // SAFETY: the file comes from the hub cache and is not modified while mapped.
            let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DTYPE, device)? };
            Ok(vb)
        }
        WeightsFormat::Pth => Ok(VarBuilder::from_pth(path, DTYPE, device)?),
    }
}

/// BERT-family sentence embedder with attention-masked mean pooling.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dimension: usize,
    batch_size: usize,
    normalize: bool,
}

impl BertEmbedder {
    /// Load the model named in `config` from the Hugging Face Hub.
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!(model = %config.model_id, "loading embedding model");
        Self::load_inner(config).map_err(|e| SpanEvalError::ModelLoad(format!("{e:#}")))
    }

    fn load_inner(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HF Hub API")?;
        let repo = api.repo(Repo::new(config.model_id.clone(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to get config.json")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to get tokenizer.json")?;
        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .context("Failed to get model weights")?;

        let raw_config = std::fs::read_to_string(&config_path)?;
        let bert_config: BertConfig =
            serde_json::from_str(&raw_config).context("Failed to parse config")?;
        let dimension = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .context("config.json has no hidden_size")? as usize;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        let vb = load_weights(&weights_path, &device).with_context(|| {
            format!("Failed to load model weights from {}", weights_path.display())
        })?;

        let model = BertModel::load(vb, &bert_config).context("Failed to load BERT model")?;

        tracing::info!(
            model = %config.model_id,
            dimension,
            max_length = config.max_length,
            "embedding model ready"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: config.model_id.clone(),
            dimension,
            batch_size: config.batch_size.max(1),
            normalize: true,
        })
    }

    /// Run one forward pass over `texts` (non-empty).
    fn embed_chunk(&self, texts: &[&str]) -> anyhow::Result<Vec<Embedding>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids_vec = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask_vec = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let mut ids = encoding.get_ids().to_vec();
            let mut mask = encoding.get_attention_mask().to_vec();
            ids.resize(max_len, 0);
            mask.resize(max_len, 0);
            input_ids_vec.extend(ids);
            attention_mask_vec.extend(mask);
        }

        let shape = (texts.len(), max_len);
        let input_ids = Tensor::from_vec(input_ids_vec, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(attention_mask_vec, shape, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over the sequence, ignoring padding.
        let mask = attention_mask
            .unsqueeze(2)?
            .to_dtype(output.dtype())?
            .broadcast_as(output.shape())?;
        let summed = (output * &mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = (summed / counts)?;

        let pooled = if self.normalize {
            let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
            pooled.broadcast_div(&norms)?
        } else {
            pooled
        };

        Ok(pooled.to_vec2::<f32>()?)
    }

    fn embed_all(&self, texts: &[&str]) -> anyhow::Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_chunk(chunk)?);
        }
        Ok(embeddings)
    }
}

impl EmbeddingProvider for BertEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(texts = texts.len(), model = %self.model_id, "embedding batch");
        self.embed_all(texts)
            .map_err(|e| SpanEvalError::Embedding(format!("{e:#}")))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}
