//! scout-refactor
//!
//! Downstream of retrieval: takes the winning Python file, maps its call
//! structure, asks a chat-completions model for a refactored service class
//! plus tests, and writes the fenced code it gets back.

pub mod error;
pub mod extract;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod visualizer;

pub use error::{RefactorError, Result};
pub use extract::{python_blocks, save_code_blocks};
pub use llm::{RefactoringClient, RefactoringModel};
pub use parser::{extract_functions, FunctionChunk, FunctionExtractor};
pub use pipeline::{call_context, run_pipeline, run_pipeline_with, PipelineOutput};
pub use visualizer::{mermaid_graph, write_workflow_graph};
