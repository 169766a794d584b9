//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g. `APP_INDEX__TOP_K`).
//! Configured paths expand `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory holding the sparse snapshot.
    pub data_dir: String,
    /// Snapshot file name inside `data_dir`.
    pub sparse_snapshot: String,
    pub vector_dir: String,
    pub table: String,
    pub top_k: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            sparse_snapshot: "sparse_index.json".to_string(),
            vector_dir: "vector_db".to_string(),
            table: "code_files".to_string(),
            top_k: 10,
        }
    }
}

impl IndexSettings {
    pub fn snapshot_path(&self) -> PathBuf {
        expand_path(&self.data_dir).join(&self.sparse_snapshot)
    }

    pub fn vector_path(&self) -> PathBuf {
        expand_path(&self.vector_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub max_documents: usize,
    pub max_chars: usize,
    pub min_chars: usize,
    pub extensions: Vec<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self { max_documents: 20, max_chars: 3000, min_chars: 50, extensions: vec!["py".to_string()] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub embedding_dir: String,
    pub reranker_dir: String,
    pub embedding_max_len: usize,
    pub reranker_max_len: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            embedding_dir: "models/all-MiniLM-L6-v2".to_string(),
            reranker_dir: "models/ms-marco-MiniLM-L-6-v2".to_string(),
            embedding_max_len: 256,
            reranker_max_len: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub output_dir: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "meta-llama/llama-3.2-3b-instruct".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_secs: 120,
            output_dir: "generated".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub discovery: DiscoverySettings,
    pub models: ModelSettings,
    pub llm: LlmSettings,
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.index.top_k == 0 {
            return Err(Error::InvalidConfig("index.top_k must be at least 1".to_string()));
        }
        if self.discovery.max_chars <= self.discovery.min_chars {
            return Err(Error::InvalidConfig(format!(
                "discovery.max_chars ({}) must exceed discovery.min_chars ({})",
                self.discovery.max_chars, self.discovery.min_chars
            )));
        }
        if self.discovery.extensions.is_empty() {
            return Err(Error::InvalidConfig("discovery.extensions is empty".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
