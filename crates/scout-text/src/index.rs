use serde::{Deserialize, Serialize};

use scout_core::error::{Error, Result};
use scout_core::types::{DocId, Document, SearchHit, SourceKind};

use crate::bm25::{Bm25Model, Bm25Params};
use crate::tantivy_utils::tokenize;

/// BM25 model plus the parallel position -> identifier mapping. The two are
/// only ever built, stored and restored together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseIndex {
	model: Bm25Model,
	doc_ids: Vec<DocId>,
}

impl SparseIndex {
	pub fn build(documents: &[Document]) -> Self {
		Self::build_with_params(documents, Bm25Params::default())
	}

	pub fn build_with_params(documents: &[Document], params: Bm25Params) -> Self {
		let corpus: Vec<Vec<String>> = documents.iter().map(|d| tokenize(&d.text)).collect();
		let model = Bm25Model::fit(&corpus, params);
		let doc_ids = documents.iter().map(|d| d.id.clone()).collect();
		tracing::info!(documents = documents.len(), "trained sparse model");
		Self { model, doc_ids }
	}

	pub fn len(&self) -> usize { self.doc_ids.len() }

	pub fn is_empty(&self) -> bool { self.doc_ids.is_empty() }

	pub fn doc_ids(&self) -> &[DocId] { &self.doc_ids }

	/// Scores for every document, in insertion order.
	pub fn scores(&self, query: &str) -> Vec<f64> {
		self.model.scores(&tokenize(query))
	}

	/// The `k` best documents. Ties keep ascending insertion order; zero-score
	/// documents are still returned when fewer than `k` documents match.
	pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
		let scores = self.scores(query);
		let mut order: Vec<usize> = (0..scores.len()).collect();
		order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));
		order
			.into_iter()
			.take(k)
			.map(|i| SearchHit { id: self.doc_ids[i].clone(), score: scores[i] as f32, source: SourceKind::Text })
			.collect()
	}

	pub(crate) fn check_consistency(&self) -> Result<()> {
		if self.model.len() != self.doc_ids.len() {
			return Err(Error::Inconsistent(format!(
				"sparse model has {} documents but id mapping has {}",
				self.model.len(),
				self.doc_ids.len()
			)));
		}
		Ok(())
	}
}
