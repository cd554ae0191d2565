//! # concierge-agent
//!
//! Agent implementations for Concierge pipelines.
//!
//! - [`LlmAgent`] - model-driven agent with tools, templated instructions and
//!   an optional `output_key`; with an output schema the stored value is the
//!   decoded JSON reply
//! - [`CustomAgent`] - closure-backed agent
//! - [`SequentialAgent`] / [`LoopAgent`] - run sub-agents in order, sharing
//!   session state between them

mod custom_agent;
mod llm_agent;
pub mod structured_output;
pub mod tool_call_markup;
mod workflow;

pub use concierge_core::Agent;
pub use custom_agent::{CustomAgent, CustomAgentBuilder};
pub use llm_agent::{DEFAULT_MAX_ITERATIONS, LlmAgent, LlmAgentBuilder};
pub use workflow::{DEFAULT_LOOP_MAX_ITERATIONS, LoopAgent, SequentialAgent};
