//! Blocking client for an OpenAI-compatible chat-completions endpoint
//! (OpenRouter by default).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use scout_core::config::LlmSettings;

use crate::error::{RefactorError, Result};

const SYSTEM_PROMPT: &str = "You are an expert Python Refactoring Agent.";
const REFERER: &str = "https://github.com/codescout";
const TITLE: &str = "codescout";

/// Anything that can turn a question plus call-graph context into a
/// refactoring proposal.
pub trait RefactoringModel {
    fn propose_refactoring(&self, question: &str, context: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChatMessage,
}

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a senior software architect.\n\n\
         CONTEXT:\n{context}\n\n\
         USER REQUEST: {question}\n\n\
         TASK:\n\
         1. Analyze the dependencies.\n\
         2. Write a refactored 'Service Class' in Python.\n\
         3. Write a Pytest unit test.\n"
    )
}

pub struct RefactoringClient {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl RefactoringClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Reads the key from the environment variable named in the settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RefactorError::MissingApiKey(settings.api_key_env.clone()))?;
        Self::new(&settings.base_url, &settings.model, &api_key, Duration::from_secs(settings.timeout_secs))
    }
}

impl RefactoringModel for RefactoringClient {
    fn propose_refactoring(&self, question: &str, context: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system".into(), content: SYSTEM_PROMPT.into() },
                ChatMessage { role: "user".into(), content: build_prompt(question, context) },
            ],
        };
        let url = format!("{}/chat/completions", self.base_url);
        tracing::info!(model = %self.model, %url, "requesting refactoring proposal");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RefactorError::Api { status: status.as_u16(), body });
        }
        let parsed: ChatResponse = resp.json()?;
        parsed.choices.into_iter().next().map(|c| c.message.content).ok_or(RefactorError::EmptyResponse)
    }
}
