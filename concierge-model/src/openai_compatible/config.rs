//! Configuration for OpenAI-compatible chat-completions providers.

use serde::{Deserialize, Serialize};

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Ollama's OpenAI-compatible endpoint on a local install.
pub const OLLAMA_API_BASE: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatibleConfig {
    /// Provider display name used in logs and error messages.
    pub provider_name: String,
    /// Bearer token. Empty for providers that do not authenticate.
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl OpenAiCompatibleConfig {
    pub fn new(
        provider_name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            api_key: String::new(),
            model: model.into(),
            base_url: base_url.into(),
            max_tokens: None,
        }
    }

    /// Groq hosted inference, e.g. `groq(key, "openai/gpt-oss-20b")`.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("groq", GROQ_API_BASE, model).with_api_key(api_key)
    }

    /// Local Ollama server, e.g. `ollama("deepseek-r1:7b")`.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new("ollama", OLLAMA_API_BASE, model)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
