use anyhow::{anyhow, bail, Result};
use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::{EncodeInput, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Token tensors for one padded batch, each shaped `[B,T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

/// Load `tokenizer.json`, pad to the longest sequence of each batch and
/// truncate to `max_len` tokens.
pub fn load_tokenizer(path: &Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
    let padding = tokenizer
        .get_padding()
        .cloned()
        .map(|p| PaddingParams { strategy: PaddingStrategy::BatchLongest, ..p })
        .unwrap_or_default();
    tokenizer.with_padding(Some(padding));
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(tokenizer)
}

/// Encode single texts or (query, passage) pairs into device tensors.
pub fn encode_batch_on_device<'s, E>(tokenizer: &Tokenizer, inputs: Vec<E>, device: &Device) -> Result<EncodedBatch>
where
    E: Into<EncodeInput<'s>> + Send,
{
    let encodings = tokenizer.encode_batch(inputs, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let Some(first) = encodings.first() else { bail!("cannot encode an empty batch") };
    let (batch, len) = (encodings.len(), first.get_ids().len());
    let mut ids = Vec::with_capacity(batch * len);
    let mut type_ids = Vec::with_capacity(batch * len);
    let mut mask = Vec::with_capacity(batch * len);
    for enc in &encodings {
        if enc.get_ids().len() != len { bail!("unpadded batch: {} vs {} tokens", enc.get_ids().len(), len); }
        ids.extend_from_slice(enc.get_ids());
        type_ids.extend_from_slice(enc.get_type_ids());
        mask.extend_from_slice(enc.get_attention_mask());
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (batch, len), device)?,
        token_type_ids: Tensor::from_vec(type_ids, (batch, len), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, len), device)?,
    })
}
