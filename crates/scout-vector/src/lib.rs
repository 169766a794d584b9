//! scout-vector
//!
//! Persistent dense index on LanceDB: (id, content, vector) rows keyed by id,
//! cosine nearest-neighbour search, and a `meta` table recording the build
//! fingerprint.

pub mod schema;
pub mod store;
pub mod table;

pub use store::LanceVectorStore;
