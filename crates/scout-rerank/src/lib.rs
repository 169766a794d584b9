//! scout-rerank
//!
//! Second-pass relevance scoring over a small candidate set. The model-backed
//! scorer is a BERT cross-encoder (ms-marco-MiniLM-L-6-v2 layout) that reads
//! the query and the candidate jointly; the keyword scorer is a cheap
//! deterministic stand-in.

use anyhow::Result;
use std::path::Path;

use candle_core::{Device, IndexOp};
use candle_nn::{Linear, Module};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use scout_core::config::ModelSettings;
use scout_core::error::Error;
use scout_core::traits::Reranker;
use scout_core::types::{DocId, RankedResult};
use scout_embed::{encode_batch_on_device, load_tokenizer, load_var_builder, resolve_model_dir, select_device};

pub struct CrossEncoder {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), max_len)?;
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let vb = load_var_builder(model_dir, &device)?;
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = candle_nn::linear(config.hidden_size, config.hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;
        Ok(Self { bert, pooler, classifier, tokenizer, device })
    }

    /// One logit per (query, candidate) pair.
    pub fn score_pairs(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() { return Ok(Vec::new()); }
        let pairs: Vec<(&str, &str)> = candidates.iter().map(|c| (query, c.as_str())).collect();
        let batch = encode_batch_on_device(&self.tokenizer, pairs, &self.device)?;
        let hidden = self.bert.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?.squeeze(1)?;
        Ok(logits.to_device(&Device::Cpu)?.to_vec1::<f32>()?)
    }
}

impl Reranker for CrossEncoder {
    fn score(&self, query: &str, candidates: &[String]) -> scout_core::error::Result<Vec<f32>> {
        self.score_pairs(query, candidates).map_err(|e| Error::Rerank(format!("{e:#}")))
    }
}

/// Fraction of query words that occur (as substrings, case-insensitive) in
/// the candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordOverlapReranker;

impl Reranker for KeywordOverlapReranker {
    fn score(&self, query: &str, candidates: &[String]) -> scout_core::error::Result<Vec<f32>> {
        let query_lower = query.to_lowercase();
        let words: Vec<&str> = query_lower.split_whitespace().collect();
        Ok(candidates
            .iter()
            .map(|c| {
                if words.is_empty() { return 0.0; }
                let content = c.to_lowercase();
                let hits = words.iter().filter(|w| content.contains(*w)).count();
                hits as f32 / words.len() as f32
            })
            .collect())
    }
}

/// Score every candidate and order descending. Equal scores keep input order.
pub fn rank(
    reranker: &dyn Reranker,
    query: &str,
    candidates: &[(DocId, String)],
) -> scout_core::error::Result<Vec<RankedResult>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let texts: Vec<String> = candidates.iter().map(|(_, text)| text.clone()).collect();
    let scores = reranker.score(query, &texts)?;
    if scores.len() != candidates.len() {
        return Err(Error::Rerank(format!(
            "re-ranker returned {} scores for {} candidates",
            scores.len(),
            candidates.len()
        )));
    }
    let mut ranked: Vec<RankedResult> = candidates
        .iter()
        .zip(scores)
        .map(|((id, _), score)| RankedResult { id: id.clone(), score })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(ranked)
}

pub fn use_fake_reranker() -> bool {
    std::env::var("APP_USE_FAKE_RERANKER").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_reranker(settings: &ModelSettings) -> scout_core::error::Result<Box<dyn Reranker>> {
    if use_fake_reranker() {
        tracing::info!("using KeywordOverlapReranker");
        return Ok(Box::new(KeywordOverlapReranker));
    }
    let dir = resolve_model_dir(&settings.reranker_dir, "APP_RERANKER_MODEL_DIR")
        .map_err(|e| Error::NotFound(format!("{e:#}")))?;
    let model = CrossEncoder::load(&dir, settings.reranker_max_len)
        .map_err(|e| Error::Rerank(format!("{e:#}")))?;
    Ok(Box::new(model))
}
