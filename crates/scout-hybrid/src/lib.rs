//! Hybrid retrieval: dense nearest neighbours + BM25, unioned, then re-ranked
//! by a cross-encoder that sees query and candidate together.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use scout_core::config::{DiscoverySettings, Settings};
use scout_core::discovery::FileDiscovery;
use scout_core::error::{Error, Result};
use scout_core::traits::{Embedder, Reranker, VectorStore};
use scout_core::types::{DocId, Document, RankedResult, VectorEntry};
use scout_embed::get_default_embedder;
use scout_rerank::{get_default_reranker, rank};
use scout_text::{SparseIndex, SparseSnapshot};
use scout_vector::LanceVectorStore;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}";

/// Outcome of one build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub documents: usize,
    pub build_id: String,
}

pub struct HybridRetrievalEngine<VS>
where
    VS: VectorStore,
{
    embedder: Box<dyn Embedder>,
    reranker: Box<dyn Reranker>,
    vectors: VS,
    sparse: Option<SparseSnapshot>,
    snapshot_path: PathBuf,
    discovery: FileDiscovery,
}

impl<VS> HybridRetrievalEngine<VS>
where
    VS: VectorStore,
{
    /// Restores the persisted sparse snapshot, if one exists, and checks it
    /// was written by the same build as the vector store.
    pub fn open(
        vectors: VS,
        embedder: Box<dyn Embedder>,
        reranker: Box<dyn Reranker>,
        snapshot_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let snapshot_path = snapshot_path.into();
        let sparse = SparseSnapshot::load_if_present(&snapshot_path)?;
        if let Some(snapshot) = &sparse {
            let stored = vectors.build_id()?;
            if stored.as_deref() != Some(snapshot.build_id.as_str()) {
                return Err(Error::Inconsistent(format!(
                    "sparse snapshot {} is from build {} but the vector store is from build {}",
                    snapshot_path.display(),
                    snapshot.build_id,
                    stored.as_deref().unwrap_or("<none>")
                )));
            }
            tracing::info!(documents = snapshot.index.len(), build_id = %snapshot.build_id, "restored sparse index");
        }
        Ok(Self { embedder, reranker, vectors, sparse, snapshot_path, discovery: FileDiscovery::default() })
    }

    /// Engine that ignores any persisted sparse state. Used to rebuild after
    /// the snapshot and the vector store have drifted apart.
    pub fn fresh(
        vectors: VS,
        embedder: Box<dyn Embedder>,
        reranker: Box<dyn Reranker>,
        snapshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            reranker,
            vectors,
            sparse: None,
            snapshot_path: snapshot_path.into(),
            discovery: FileDiscovery::default(),
        }
    }

    pub fn with_discovery(mut self, settings: DiscoverySettings) -> Self {
        self.discovery = FileDiscovery::new(settings);
        self
    }

    /// True once a sparse index is available, from this process or from disk.
    pub fn is_ready(&self) -> bool {
        self.sparse.is_some()
    }

    pub fn vector_store(&self) -> &VS {
        &self.vectors
    }

    pub fn build_index(&mut self, corpus_root: &Path) -> Result<BuildReport> {
        let documents = self.discovery.discover(corpus_root);
        self.index_documents(documents)
    }

    /// Embeds and upserts every document, drops rows of earlier builds that
    /// are not part of this corpus, then trains and persists the sparse index
    /// and finally stamps the vector store with the build fingerprint.
    pub fn index_documents(&mut self, documents: Vec<Document>) -> Result<BuildReport> {
        let mut seen = HashSet::new();
        let documents: Vec<Document> = documents.into_iter().filter(|d| seen.insert(d.id.clone())).collect();
        let build_id = fingerprint(&documents);
        tracing::info!(documents = documents.len(), build_id = %build_id, "building hybrid index");

        let pb = ProgressBar::new(documents.len() as u64);
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("#>-"));
        let mut entries = Vec::with_capacity(documents.len());
        for doc in &documents {
            pb.set_message(doc.id.clone());
            let vector = self.embedder.embed(&doc.text)?;
            entries.push(VectorEntry { id: doc.id.clone(), vector, text: doc.text.clone() });
            pb.inc(1);
        }
        pb.finish_and_clear();
        self.vectors.upsert(&entries)?;

        let ids: Vec<DocId> = documents.iter().map(|d| d.id.clone()).collect();
        let removed = self.vectors.retain_only(&ids)?;
        if removed > 0 {
            tracing::info!(removed, "dropped entries outside the current corpus");
        }

        let snapshot = SparseSnapshot::new(build_id.clone(), SparseIndex::build(&documents));
        snapshot.save(&self.snapshot_path)?;
        self.vectors.set_build_id(&build_id)?;
        self.sparse = Some(snapshot);

        Ok(BuildReport { documents: documents.len(), build_id })
    }

    /// Union of the dense and sparse top-`top_k` identifiers, dense first,
    /// without duplicates.
    pub fn candidates(&self, query: &str, top_k: usize) -> Result<Vec<DocId>> {
        let query_vec = self.embedder.embed(query)?;
        let dense = self.vectors.search_vec(&query_vec, top_k)?;
        let sparse = self.sparse.as_ref().ok_or_else(|| {
            Error::NotFound(format!("sparse index at {} (run a build first)", self.snapshot_path.display()))
        })?;
        let lexical = sparse.index.search(query, top_k);
        tracing::debug!(dense = dense.len(), sparse = lexical.len(), "first-pass retrieval");

        let mut seen = HashSet::new();
        Ok(dense
            .into_iter()
            .chain(lexical)
            .map(|h| h.id)
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    /// Every candidate with its re-ranker score, best first.
    pub fn search_ranked(&self, query: &str, top_k: usize) -> Result<Vec<RankedResult>> {
        let candidates = self.candidates(query, top_k)?;
        if candidates.is_empty() {
            tracing::info!(query, "no candidates");
            return Ok(Vec::new());
        }
        let documents = self.vectors.fetch(&candidates)?;
        if documents.len() != candidates.len() {
            let found: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
            let missing: Vec<&str> =
                candidates.iter().map(String::as_str).filter(|id| !found.contains(id)).collect();
            return Err(Error::Inconsistent(format!(
                "candidates missing from the vector store: {}",
                missing.join(", ")
            )));
        }
        let pairs: Vec<(DocId, String)> = documents.into_iter().map(|d| (d.id, d.text)).collect();
        let ranked = rank(self.reranker.as_ref(), query, &pairs)?;
        if let Some(best) = ranked.first() {
            tracing::info!(winner = %best.id, score = best.score, candidates = ranked.len(), "re-ranked");
        }
        Ok(ranked)
    }

    /// The single most relevant identifier, or `None` when nothing matched.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Option<DocId>> {
        Ok(self.search_ranked(query, top_k)?.into_iter().next().map(|r| r.id))
    }
}

impl HybridRetrievalEngine<LanceVectorStore> {
    /// Engine wired from settings: configured models (or the fake providers
    /// when `APP_USE_FAKE_*` is set) and the LanceDB store.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (store, embedder, reranker) = components(settings)?;
        let engine = Self::open(store, embedder, reranker, settings.index.snapshot_path())?;
        Ok(engine.with_discovery(settings.discovery.clone()))
    }

    /// Like [`Self::from_settings`] but skips loading the sparse snapshot.
    pub fn fresh_from_settings(settings: &Settings) -> Result<Self> {
        let (store, embedder, reranker) = components(settings)?;
        let engine = Self::fresh(store, embedder, reranker, settings.index.snapshot_path());
        Ok(engine.with_discovery(settings.discovery.clone()))
    }
}

fn components(settings: &Settings) -> Result<(LanceVectorStore, Box<dyn Embedder>, Box<dyn Reranker>)> {
    let embedder = get_default_embedder(&settings.models)?;
    let reranker = get_default_reranker(&settings.models)?;
    let store = LanceVectorStore::open(&settings.index.vector_path(), &settings.index.table, embedder.dim())?;
    Ok((store, embedder, reranker))
}

/// Stable fingerprint of an ordered corpus.
pub fn fingerprint(documents: &[Document]) -> String {
    let mut hasher = blake3::Hasher::new();
    for d in documents {
        hasher.update(d.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(d.text.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}
