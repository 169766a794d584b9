use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::parser::FunctionChunk;

/// Builtins that would only add noise to the graph.
pub const SKIPPED_CALLS: &[&str] = &["print", "len", "str", "int", "dict"];

pub const GRAPH_FILE: &str = "workflow.mmd";

/// Mermaid `graph TD` with one `caller --> callee` edge per distinct call.
pub fn mermaid_graph(functions: &[FunctionChunk]) -> String {
    let mut seen = HashSet::new();
    let mut out = String::from("graph TD\n");
    for f in functions {
        for call in f.calls.iter().filter(|c| !SKIPPED_CALLS.contains(&c.as_str())) {
            if seen.insert((f.name.as_str(), call.as_str())) {
                out.push_str(&format!("    {} --> {}\n", f.name, call));
            }
        }
    }
    out
}

pub fn write_workflow_graph(functions: &[FunctionChunk], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(GRAPH_FILE);
    fs::write(&path, mermaid_graph(functions))?;
    tracing::info!(path = %path.display(), "wrote call graph");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn chunk(name: &str, calls: &[&str]) -> FunctionChunk {
        FunctionChunk { name: name.into(), code: String::new(), calls: calls.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>() }
    }

    #[test]
    fn builtins_are_skipped_and_edges_deduplicated() {
        let graph = mermaid_graph(&[chunk("run", &["len", "load", "print"]), chunk("run", &["load"]), chunk("load", &["open"])]);
        assert_eq!(graph, "graph TD\n    run --> load\n    load --> open\n");
    }

    #[test]
    fn no_calls_gives_a_bare_header() {
        assert_eq!(mermaid_graph(&[chunk("idle", &[])]), "graph TD\n");
    }

    #[test]
    fn graph_file_lands_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workflow_graph(&[chunk("a", &["b"])], &dir.path().join("out")).unwrap();
        assert_eq!(path, dir.path().join("out").join(GRAPH_FILE));
        assert!(std::fs::read_to_string(path).unwrap().contains("a --> b"));
    }
}
