use scout_core::error::Error;
use scout_core::traits::{Embedder, VectorStore};
use scout_core::types::VectorEntry;
use scout_embed::HashedEmbedder;
use scout_vector::LanceVectorStore;
use tempfile::TempDir;

const DIM: usize = 32;

fn entry(embedder: &HashedEmbedder, id: &str, text: &str) -> VectorEntry {
    VectorEntry { id: id.to_string(), vector: embedder.embed(text).unwrap(), text: text.to_string() }
}

fn seed(store: &LanceVectorStore, embedder: &HashedEmbedder) {
    store.upsert(&[
        entry(embedder, "tax.py", "calculate tax rate for invoice"),
        entry(embedder, "graph.py", "render mermaid workflow graph"),
        entry(embedder, "util.py", "convert value to float"),
    ]).expect("upsert");
}

#[test]
fn nearest_neighbour_returns_closest_id_first() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashedEmbedder::new(DIM);
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).expect("store");
    seed(&store, &embedder);

    let hits = store.search_vec(&embedder.embed("render mermaid workflow graph").unwrap(), 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "graph.py");
    assert!(hits[0].score >= hits[1].score);
}

#[test]
fn upsert_replaces_existing_ids() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashedEmbedder::new(DIM);
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
    seed(&store, &embedder);
    seed(&store, &embedder);
    assert_eq!(store.count().unwrap(), 3, "same ids twice do not duplicate rows");

    store.upsert(&[entry(&embedder, "util.py", "parse date string")]).unwrap();
    assert_eq!(store.count().unwrap(), 3);
    let docs = store.fetch(&["util.py".to_string()]).unwrap();
    assert_eq!(docs[0].text, "parse date string", "last write wins");
}

#[test]
fn fetch_preserves_request_order_and_skips_unknown() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashedEmbedder::new(DIM);
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
    seed(&store, &embedder);

    let ids = vec!["util.py".to_string(), "missing.py".to_string(), "tax.py".to_string()];
    let docs = store.fetch(&ids).unwrap();
    let got: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(got, ["util.py", "tax.py"]);
}

#[test]
fn empty_store_answers_without_error() {
    let tmp = TempDir::new().unwrap();
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
    assert!(store.search_vec(&vec![0.1; DIM], 5).unwrap().is_empty());
    assert!(store.fetch(&["a".to_string()]).unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.build_id().unwrap(), None);
}

#[test]
fn state_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashedEmbedder::new(DIM);
    {
        let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
        seed(&store, &embedder);
        store.set_build_id("first").unwrap();
        store.set_build_id("second").unwrap();
    }
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.build_id().unwrap().as_deref(), Some("second"));
}

#[test]
fn reopening_with_other_dimension_is_inconsistent() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashedEmbedder::new(DIM);
    {
        let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
        seed(&store, &embedder);
    }
    let err = LanceVectorStore::open(tmp.path(), "documents_test", DIM * 2).err().expect("dim mismatch");
    assert!(matches!(err, Error::Inconsistent(_)));
}

#[test]
fn retain_only_prunes_ids_outside_the_corpus() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashedEmbedder::new(DIM);
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
    seed(&store, &embedder);

    assert_eq!(store.retain_only(&["tax.py".to_string(), "util.py".to_string()]).unwrap(), 1);
    assert_eq!(store.count().unwrap(), 2);
    assert!(store.fetch(&["graph.py".to_string()]).unwrap().is_empty());

    assert_eq!(store.retain_only(&[]).unwrap(), 2);
    assert_eq!(store.count().unwrap(), 0);
    let hits = store.search_vec(&embedder.embed("calculate tax").unwrap(), 3).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn retain_only_on_missing_table_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let store = LanceVectorStore::open(tmp.path(), "documents_test", DIM).unwrap();
    assert_eq!(store.retain_only(&["a.py".to_string()]).unwrap(), 0);
}
