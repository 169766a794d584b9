use std::fs;
use std::path::{Path, PathBuf};

use scout_core::config::LlmSettings;

use crate::error::{RefactorError, Result};
use crate::extract::save_code_blocks;
use crate::llm::{RefactoringClient, RefactoringModel};
use crate::parser::{extract_functions, FunctionChunk};
use crate::visualizer::write_workflow_graph;

/// Functions summarised for the model.
pub const CONTEXT_FUNCTIONS: usize = 5;

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub functions: usize,
    pub graph_path: PathBuf,
    pub response: String,
    pub saved: Vec<PathBuf>,
}

/// `Func: <name> | Calls: [a, b]` for the first `limit` functions.
pub fn call_context(functions: &[FunctionChunk], limit: usize) -> String {
    functions
        .iter()
        .take(limit)
        .map(|f| format!("Func: {} | Calls: [{}]", f.name, f.calls.iter().map(String::as_str).collect::<Vec<_>>().join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_pipeline(question: &str, target_file: &Path, settings: &LlmSettings) -> Result<PipelineOutput> {
    let client = RefactoringClient::from_settings(settings)?;
    run_pipeline_with(&client, question, target_file, Path::new(&settings.output_dir))
}

pub fn run_pipeline_with(model: &dyn RefactoringModel, question: &str, target_file: &Path, output_dir: &Path) -> Result<PipelineOutput> {
    let source = fs::read(target_file).map_err(|source| RefactorError::ReadSource { path: target_file.to_path_buf(), source })?;
    let source = String::from_utf8_lossy(&source);
    let functions = extract_functions(&source)?;
    tracing::info!(file = %target_file.display(), functions = functions.len(), "parsed target");

    let graph_path = write_workflow_graph(&functions, output_dir)?;
    let response = model.propose_refactoring(question, &call_context(&functions, CONTEXT_FUNCTIONS))?;
    let saved = save_code_blocks(&response, output_dir)?;
    Ok(PipelineOutput { functions: functions.len(), graph_path, response, saved })
}
