use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scout_core::config::{Config, Settings};
use scout_core::error::Error;
use scout_hybrid::HybridRetrievalEngine;
use scout_refactor::run_pipeline;

/// Find the file a question is about, then propose a refactoring for it.
#[derive(Debug, Parser)]
#[command(name = "scout", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index a source folder (dense vectors + BM25)
    Init {
        /// Folder to scan
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,
    },

    /// Ask a question about the indexed code
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Candidates taken from each retriever (defaults to index.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Stop after retrieval
        #[arg(long)]
        skip_refactor: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn step(message: &str) {
    println!("\n{} {}", "▶".bright_magenta(), message.bold());
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let settings = Config::load()?.settings()?;
    tracing::debug!(?settings, "loaded settings");

    match cli.command {
        Command::Init { folder } => run_init(&settings, &folder),
        Command::Ask { question, top_k, skip_refactor } => {
            let top_k = top_k.unwrap_or(settings.index.top_k);
            run_ask(&settings, &question, top_k, skip_refactor)
        }
    }
}

fn run_init(settings: &Settings, folder: &Path) -> Result<()> {
    step(&format!("Indexing {}", folder.display()));
    let started = Instant::now();
    let mut engine = HybridRetrievalEngine::fresh_from_settings(settings)?;
    let report = engine.build_index(folder)?;
    println!(
        "{} Indexed {} files in {:.2}s (build {})",
        "✓".bright_green(),
        report.documents,
        started.elapsed().as_secs_f64(),
        &report.build_id[..12.min(report.build_id.len())]
    );
    Ok(())
}

fn run_ask(settings: &Settings, question: &str, top_k: usize, skip_refactor: bool) -> Result<()> {
    println!("{} {}", "Question:".bold(), question.bright_blue());
    step("Hybrid retrieval (dense + sparse + re-rank)");

    let found = HybridRetrievalEngine::from_settings(settings).and_then(|engine| engine.search(question, top_k));
    let Some(target) = report_search(found) else {
        return Ok(());
    };
    if skip_refactor {
        return Ok(());
    }

    step("Structural analysis and refactoring");
    let output = run_pipeline(question, Path::new(&target), &settings.llm)?;
    let preview: String = output.response.chars().take(300).collect();
    println!("{}\n{}...\n{}", "=".repeat(40), preview, "=".repeat(40));
    println!("{} Call graph: {}", "✓".bright_green(), output.graph_path.display());
    if output.saved.is_empty() {
        println!("{} No code blocks found in the response.", "!".yellow());
    }
    for path in &output.saved {
        println!("{} Saved {}", "✓".bright_green(), path.display());
    }
    Ok(())
}

/// Prints the retrieval outcome. Search failures are reported, not raised.
fn report_search(found: scout_core::error::Result<Option<String>>) -> Option<String> {
    match found {
        Ok(Some(target)) => {
            println!("{} Target: {}", "✓".bright_green(), target);
            Some(target)
        }
        Ok(None) => {
            println!("{} No relevant code found.", "✗".bright_red());
            None
        }
        Err(e) => {
            println!("{} Search error: {}", "✗".bright_red(), e);
            if e.needs_rebuild() {
                println!("{} Run `scout init <folder>` first.", "!".yellow());
            }
            None
        }
    }
}
