//! Single-record persistence for the sparse index.
//!
//! The model, the id mapping and the build fingerprint are written as one
//! JSON document through a temp file + rename, so a reader sees either the
//! previous snapshot or the new one, never a mix.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use scout_core::error::{Error, Result};

use crate::index::SparseIndex;

pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseSnapshot {
    pub format: u32,
    /// Fingerprint shared with the vector store written by the same build.
    pub build_id: String,
    pub index: SparseIndex,
}

impl SparseSnapshot {
    pub fn new(build_id: impl Into<String>, index: SparseIndex) -> Self {
        Self { format: SNAPSHOT_FORMAT, build_id: build_id.into(), index }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let bytes = serde_json::to_vec(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::info!(path = %path.display(), documents = self.index.len(), "persisted sparse snapshot");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("sparse index snapshot at {}", path.display())));
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Inconsistent(format!("unreadable sparse snapshot {}: {}", path.display(), e)))?;
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(Error::Inconsistent(format!(
                "sparse snapshot format {} (expected {})",
                snapshot.format, SNAPSHOT_FORMAT
            )));
        }
        snapshot.index.check_consistency()?;
        Ok(snapshot)
    }

    /// `Ok(None)` when no snapshot has been written yet.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(s) => Ok(Some(s)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
