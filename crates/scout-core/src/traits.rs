use crate::error::Result;
use crate::types::{Document, SearchHit, VectorEntry};

/// Dense text encoder. Index-time and query-time vectors must come from the
/// same implementation.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::error::Error::Embedding("embedder returned no vector".to_string()))
    }
}

/// Scores (query, candidate) pairs jointly. Returns one score per candidate,
/// in input order; higher is more relevant.
pub trait Reranker: Send + Sync {
    fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>>;
}

/// Persistent (id, vector, text) store with upsert semantics.
pub trait VectorStore: Send + Sync {
    fn upsert(&self, entries: &[VectorEntry]) -> Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>>;
    /// Stored documents for `ids`; unknown ids are omitted.
    fn fetch(&self, ids: &[String]) -> Result<Vec<Document>>;
    fn count(&self) -> Result<usize>;
    /// Deletes every entry whose id is not in `ids`; returns how many went.
    fn retain_only(&self, ids: &[String]) -> Result<usize>;
    /// Fingerprint of the build that last wrote this store, if any.
    fn build_id(&self) -> Result<Option<String>>;
    fn set_build_id(&self, build_id: &str) -> Result<()>;
}
