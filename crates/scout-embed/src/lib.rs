//! scout-embed
//!
//! Dense sentence embeddings with candle. The real provider is a BERT-family
//! encoder (all-MiniLM-L6-v2 layout) with masked mean pooling; the hashed
//! provider is a deterministic stand-in for tests and offline development.

use anyhow::{anyhow, Result};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use twox_hash::XxHash64;

use scout_core::config::{expand_path, ModelSettings};
use scout_core::error::Error;
use scout_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::{device_label, select_device};
pub use pool::{l2_normalize, masked_mean_l2};
pub use tokenize::{encode_batch_on_device, load_tokenizer, EncodedBatch};

/// Dimension of all-MiniLM-L6-v2, also used by the hashed provider.
pub const DEFAULT_DIM: usize = 384;

pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), max_len)?;
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim = config.hidden_size, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim: config.hidden_size, max_len })
    }

    pub fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let batch = encode_batch_on_device(&self.tokenizer, inputs, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        let ms = start.elapsed().as_millis() as u64;
        if ms > 500 {
            tracing::warn!(n = texts.len(), ms, "slow embedding batch");
        }
        Ok(vectors)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> scout_core::error::Result<Vec<Vec<f32>>> {
        self.embed_texts(texts).map_err(|e| Error::Embedding(format!("{e:#}")))
    }
}

/// Feature-hashing embedder: each lower-cased token bumps one bucket.
/// Deterministic and L2-normalized.
pub struct HashedEmbedder { dim: usize }

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        v.iter_mut().for_each(|x| *x /= norm);
        v
    }
}

impl Embedder for HashedEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> scout_core::error::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &ModelSettings) -> scout_core::error::Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!("using HashedEmbedder");
        return Ok(Box::new(HashedEmbedder::new(DEFAULT_DIM)));
    }
    let dir = resolve_model_dir(&settings.embedding_dir, "APP_EMBEDDING_MODEL_DIR")
        .map_err(|e| Error::NotFound(format!("{e:#}")))?;
    let model = SentenceEmbedder::load(&dir, settings.embedding_max_len)
        .map_err(|e| Error::Embedding(format!("{e:#}")))?;
    Ok(Box::new(model))
}

/// Env override first, then the configured directory.
pub fn resolve_model_dir(configured: &str, env_key: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(env_key) {
        let p = expand_path(&dir);
        if p.exists() {
            tracing::info!(dir = %p.display(), "using {}", env_key);
            return Ok(p);
        }
    }
    let p = expand_path(configured);
    if p.exists() {
        return Ok(p);
    }
    Err(anyhow!("Could not locate model directory {} (set {})", p.display(), env_key))
}

/// Weights from `model.safetensors`, falling back to `pytorch_model.bin`.
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let tensors: std::collections::HashMap<String, Tensor> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let weights_path = model_dir.join("pytorch_model.bin");
        candle_core::pickle::read_all(&weights_path)?.into_iter().collect()
    };
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}
