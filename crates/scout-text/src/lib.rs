//! scout-text
//!
//! Sparse lexical retrieval: Okapi BM25 over whitespace tokens, plus the
//! snapshot record that persists the model together with its id mapping.

pub mod bm25;
pub mod index;
pub mod snapshot;
pub mod tantivy_utils;

pub use bm25::{Bm25Model, Bm25Params};
pub use index::SparseIndex;
pub use snapshot::SparseSnapshot;
