//! Domain types shared by the sparse, dense and hybrid engines.

use serde::{Deserialize, Serialize};

pub type DocId = String;

/// A unit of retrievable content.
///
/// - `id`: stable identifier, the source path for discovered files
/// - `text`: the indexed body, already truncated to the character budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A dense index entry: identifier, embedding and the text it was computed from.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub id: DocId,
    pub vector: Vec<f32>,
    pub text: String,
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// The minimal surface returned by first-pass retrieval.
///
/// `score` is engine-specific but higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub source: SourceKind,
}

/// Output of the re-ranking pass, ordered descending by `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: DocId,
    pub score: f32,
}
