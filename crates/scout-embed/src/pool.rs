//! Sentence pooling over encoder token states.

use anyhow::{ensure, Result};
use candle_core::{DType, Tensor, D};

/// Collapses `[batch, tokens, width]` token states into one unit-length
/// vector per input, averaging only the tokens the attention mask keeps.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, width) = hidden.dims3()?;
    ensure!(
        attention_mask.dims() == [batch, tokens],
        "attention mask {:?} does not cover token states {:?}",
        attention_mask.dims(),
        hidden.dims()
    );

    let keep = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&keep.unsqueeze(D::Minus1)?)?.sum(1)?;
    // a fully padded row sums to zero; keep the division finite
    let kept = keep.sum_keepdim(1)?.affine(1.0, 1e-9)?;
    let pooled = l2_normalize(&summed.broadcast_div(&kept)?)?;
    ensure!(pooled.dims() == [batch, width], "pooled {:?}, expected [{batch}, {width}]", pooled.dims());
    Ok(pooled)
}

/// Scales each row of a `[rows, width]` tensor to unit L2 norm.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = match rows.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };
    let norms = rows.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.affine(1.0, eps)?;
    Ok(rows.broadcast_div(&norms)?)
}
