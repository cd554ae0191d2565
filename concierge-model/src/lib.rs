//! # concierge-model
//!
//! Chat model clients for Concierge agents.
//!
//! ## Overview
//!
//! - [`OpenAiCompatibleClient`] - any `/chat/completions` provider (Groq, Ollama)
//! - [`model_from_id`] - build a client from a `provider/model` string
//! - [`complete`] - run one request and collect text plus token usage
//! - [`MockLlm`] - scripted model for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use concierge_model::{ModelSettings, Provider, model_from_id};
//!
//! let settings = ModelSettings::new(Provider::Groq).with_groq_api_key("gsk_...");
//! let model = model_from_id("openai/gpt-oss-20b", &settings).unwrap();
//! ```

pub mod complete;
pub mod mock;
pub mod openai_compatible;
pub mod registry;

pub use complete::{Completion, complete};
pub use mock::MockLlm;
pub use openai_compatible::{
    GROQ_API_BASE, OLLAMA_API_BASE, OpenAiCompatibleClient, OpenAiCompatibleConfig,
};
pub use registry::{ModelId, ModelSettings, Provider, config_for, model_from_id};
