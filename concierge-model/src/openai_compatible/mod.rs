//! OpenAI-compatible chat-completions provider.
//!
//! Groq and Ollama both expose `/chat/completions` in the OpenAI wire format,
//! so one client serves both:
//!
//! - **Groq**: hosted inference, bearer-token auth
//! - **Ollama**: local models such as `deepseek-r1`, no auth
//!
//! Structured output is requested through `response_format` with a JSON
//! schema taken from [`GenerateContentConfig::response_schema`].
//!
//! [`GenerateContentConfig::response_schema`]: concierge_core::GenerateContentConfig

mod client;
mod config;
pub mod convert;

pub use client::OpenAiCompatibleClient;
pub use config::{GROQ_API_BASE, OLLAMA_API_BASE, OpenAiCompatibleConfig};
