//! Source-file discovery for a build pass.
//!
//! Walks a root in sorted order and yields at most `max_documents` eligible
//! files as [`Document`]s. Unreadable files are skipped, never fatal.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::DiscoverySettings;
use crate::types::Document;

#[derive(Default)]
pub struct FileDiscovery {
    settings: DiscoverySettings,
}

impl FileDiscovery {
    pub fn new(settings: DiscoverySettings) -> Self {
        Self { settings }
    }

    pub fn discover(&self, root: &Path) -> Vec<Document> {
        let mut documents = Vec::new();
        let mut seen = HashSet::new();
        let walker = walkdir::WalkDir::new(root).sort_by_file_name().into_iter();
        for entry in walker {
            if documents.len() >= self.settings.max_documents {
                tracing::info!(limit = self.settings.max_documents, "document cap reached, stopping discovery");
                break;
            }
            let entry = match entry {
                Ok(e) => e,
                Err(e) => { tracing::warn!(error = %e, "skipping unreadable directory entry"); continue; }
            };
            // symlinks are read through; a dangling one fails the read below
            let is_file = entry.file_type().is_file() || entry.path_is_symlink();
            if !is_file || !self.is_eligible(entry.path()) { continue; }
            let path = entry.path();
            let code = match read_lossy(path) {
                Ok(code) => code,
                Err(e) => { tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file"); continue; }
            };
            if code.chars().count() <= self.settings.min_chars { continue; }
            let id = path.to_string_lossy().to_string();
            if !seen.insert(id.clone()) { continue; }
            let text = self.document_text(path, &id, &code);
            tracing::debug!(id = %id, n = documents.len() + 1, "discovered document");
            documents.push(Document::new(id, text));
        }
        tracing::info!(root = %root.display(), count = documents.len(), "discovery finished");
        documents
    }

    fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.settings.extensions.iter().any(|e| e == ext))
    }

    fn document_text(&self, path: &Path, id: &str, code: &str) -> String {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let body: String = code.chars().take(self.settings.max_chars).collect();
        format!("FILE: {}\nPATH: {}\nCONTENT:\n{}", name, id, body)
    }
}

fn read_lossy(path: &Path) -> std::io::Result<String> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).to_string())
}
