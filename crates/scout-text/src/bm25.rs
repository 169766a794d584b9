//! Okapi BM25 with pinned parameters.
//!
//! `idf(t) = ln(N - n_t + 0.5) - ln(n_t + 0.5)`; terms whose idf is negative
//! get `epsilon * mean(idf)` instead. Query terms are not de-duplicated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization.
    pub b: f64,
    /// Floor factor for negative idf values.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
    }
}

/// Trained BM25 statistics over a tokenized corpus. Document positions are
/// insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Model {
    params: Bm25Params,
    doc_freqs: Vec<BTreeMap<String, u32>>,
    doc_lens: Vec<usize>,
    avgdl: f64,
    idf: BTreeMap<String, f64>,
}

impl Bm25Model {
    pub fn fit(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let mut doc_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut containing: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_len = 0usize;

        for tokens in corpus {
            let mut freqs: BTreeMap<String, u32> = BTreeMap::new();
            for t in tokens { *freqs.entry(t.clone()).or_insert(0) += 1; }
            for term in freqs.keys() { *containing.entry(term.clone()).or_insert(0) += 1; }
            total_len += tokens.len();
            doc_lens.push(tokens.len());
            doc_freqs.push(freqs);
        }

        let n = corpus.len() as f64;
        let avgdl = if corpus.is_empty() { 0.0 } else { total_len as f64 / n };

        let mut idf = BTreeMap::new();
        let mut idf_sum = 0.0;
        let mut negative = Vec::new();
        for (term, &df) in &containing {
            let df = df as f64;
            let value = (n - df + 0.5).ln() - (df + 0.5).ln();
            idf_sum += value;
            if value < 0.0 { negative.push(term.clone()); }
            idf.insert(term.clone(), value);
        }
        let average_idf = if idf.is_empty() { 0.0 } else { idf_sum / idf.len() as f64 };
        let floor = params.epsilon * average_idf;
        for term in negative { idf.insert(term, floor); }

        Self { params, doc_freqs, doc_lens, avgdl, idf }
    }

    pub fn len(&self) -> usize { self.doc_lens.len() }

    pub fn is_empty(&self) -> bool { self.doc_lens.is_empty() }

    pub fn idf(&self, term: &str) -> Option<f64> { self.idf.get(term).copied() }

    /// One score per document, in insertion order.
    pub fn scores(&self, query: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.len()];
        if self.avgdl <= 0.0 { return scores; }
        let Bm25Params { k1, b, .. } = self.params;
        for term in query {
            let Some(idf) = self.idf.get(term).copied() else { continue };
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let tf = f64::from(freqs.get(term).copied().unwrap_or(0));
                let norm = k1 * (1.0 - b + b * self.doc_lens[i] as f64 / self.avgdl);
                scores[i] += idf * (tf * (k1 + 1.0) / (tf + norm));
            }
        }
        scores
    }
}
