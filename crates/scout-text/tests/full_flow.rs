use std::fs;

use scout_core::error::Error;
use scout_core::types::Document;
use scout_text::{SparseIndex, SparseSnapshot};
use tempfile::TempDir;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("src/tax.py", "FILE: tax.py\ndef calculate_tax(amount): return amount * rate"),
        Document::new("src/invoice.py", "FILE: invoice.py\ndef make_invoice(customer): calculate_tax (total)"),
        Document::new("src/util.py", "FILE: util.py\ndef flt(value): return float(value)"),
    ]
}

#[test]
fn snapshot_round_trip_preserves_rankings() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data").join("sparse_index.json");
    let index = SparseIndex::build(&corpus());
    SparseSnapshot::new("build-1", index.clone()).save(&path).expect("save");

    let restored = SparseSnapshot::load(&path).expect("load");
    assert_eq!(restored.build_id, "build-1");
    assert_eq!(restored.index.doc_ids(), index.doc_ids());
    for q in ["calculate_tax", "flt(value):", "invoice customer"] {
        let before: Vec<_> = index.search(q, 10).into_iter().map(|h| h.id).collect();
        let after: Vec<_> = restored.index.search(q, 10).into_iter().map(|h| h.id).collect();
        assert_eq!(before, after, "query {q}");
    }
}

#[test]
fn save_replaces_previous_snapshot() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sparse_index.json");
    SparseSnapshot::new("old", SparseIndex::build(&corpus())).save(&path).unwrap();
    SparseSnapshot::new("new", SparseIndex::build(&corpus()[..1])).save(&path).unwrap();

    let restored = SparseSnapshot::load(&path).unwrap();
    assert_eq!(restored.build_id, "new");
    assert_eq!(restored.index.len(), 1);
    // only the snapshot itself remains, no stray temp files
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn missing_snapshot_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("absent.json");
    assert!(matches!(SparseSnapshot::load(&path), Err(Error::NotFound(_))));
    assert!(SparseSnapshot::load_if_present(&path).unwrap().is_none());
}

#[test]
fn corrupt_or_partial_snapshot_requires_rebuild() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sparse_index.json");

    fs::write(&path, b"{\"format\":1,\"build_id\":\"x\"").unwrap();
    let err = SparseSnapshot::load(&path).unwrap_err();
    assert!(matches!(err, Error::Inconsistent(_)));
    assert!(err.needs_rebuild());

    // model without its id mapping
    let mut value = serde_json::to_value(SparseSnapshot::new("x", SparseIndex::build(&corpus()))).unwrap();
    value["index"]["doc_ids"] = serde_json::json!(["only-one"]);
    fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
    assert!(matches!(SparseSnapshot::load(&path), Err(Error::Inconsistent(_))));
}
