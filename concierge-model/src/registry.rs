//! `provider/model` identifiers and the factory that turns them into clients.

use crate::openai_compatible::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
use concierge_core::{ConciergeError, Llm, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    Ollama,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConciergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "ollama" => Ok(Provider::Ollama),
            other => Err(ConciergeError::Config(format!("Unknown model provider '{}'", other))),
        }
    }
}

/// A model reference such as `ollama/deepseek-r1:7b`.
///
/// Only a leading `groq/` or `ollama/` segment is treated as a provider, so
/// Groq-hosted ids that contain a slash (`openai/gpt-oss-20b`) stay intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: Option<Provider>,
    pub model: String,
}

impl ModelId {
    pub fn parse(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ConciergeError::Config("Model id must not be empty".to_string()));
        }
        if let Some((prefix, rest)) = id.split_once('/') {
            if let Ok(provider) = prefix.parse::<Provider>() {
                if rest.is_empty() {
                    return Err(ConciergeError::Config(format!("Model id '{}' has no model name", id)));
                }
                return Ok(Self { provider: Some(provider), model: rest.to_string() });
            }
        }
        Ok(Self { provider: None, model: id.to_string() })
    }

    pub fn provider_or(&self, default: Provider) -> Provider {
        self.provider.unwrap_or(default)
    }
}

/// Endpoints and credentials shared by every model a process builds.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub default_provider: Provider,
    pub groq_api_key: Option<String>,
    pub groq_base_url: Option<String>,
    pub ollama_base_url: Option<String>,
}

impl ModelSettings {
    pub fn new(default_provider: Provider) -> Self {
        Self {
            default_provider,
            groq_api_key: None,
            groq_base_url: None,
            ollama_base_url: None,
        }
    }

    pub fn with_groq_api_key(mut self, key: impl Into<String>) -> Self {
        self.groq_api_key = Some(key.into());
        self
    }

    pub fn with_groq_base_url(mut self, url: impl Into<String>) -> Self {
        self.groq_base_url = Some(url.into());
        self
    }

    pub fn with_ollama_base_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_base_url = Some(url.into());
        self
    }
}

pub fn config_for(id: &ModelId, settings: &ModelSettings) -> Result<OpenAiCompatibleConfig> {
    let config = match id.provider_or(settings.default_provider) {
        Provider::Groq => {
            let key = settings.groq_api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
                ConciergeError::Config(
                    "GROQ_API_KEY is required for groq models. Set it in the environment or .env"
                        .to_string(),
                )
            })?;
            let config = OpenAiCompatibleConfig::groq(key, &id.model);
            match &settings.groq_base_url {
                Some(url) => config.with_base_url(url),
                None => config,
            }
        }
        Provider::Ollama => {
            let config = OpenAiCompatibleConfig::ollama(&id.model);
            match &settings.ollama_base_url {
                Some(url) => config.with_base_url(url),
                None => config,
            }
        }
    };
    Ok(config)
}

/// Build a chat model from a `provider/model` string.
pub fn model_from_id(id: &str, settings: &ModelSettings) -> Result<Arc<dyn Llm>> {
    let id = ModelId::parse(id)?;
    let config = config_for(&id, settings)?;
    tracing::debug!(provider = %config.provider_name, model = %config.model, "Building model");
    let client = OpenAiCompatibleClient::new(config)?;
    Ok(Arc::new(client))
}
