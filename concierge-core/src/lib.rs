//! # concierge-core
//!
//! Core traits and types shared by every Concierge crate.
//!
//! - [`Agent`] - anything that turns an invocation into a stream of [`Event`]s
//! - [`Llm`] - a chat model behind a provider API
//! - [`Tool`] - a function an LLM agent may call
//! - [`Session`] / [`State`] - conversation history and key/value state
//! - [`ConciergeError`] / [`Result`] - unified error handling
//!
//! ## State
//!
//! State keys may carry a scope prefix:
//!
//! - `app:` - application-wide
//! - `user:` - per user
//! - `temp:` - dropped at the end of each turn

pub mod agent;
pub mod context;
pub mod error;
pub mod event;
pub mod instruction_template;
pub mod model;
pub mod tool;
pub mod types;

pub use agent::{Agent, EventStream};
pub use context::{
    IncludeContents, InvocationContext, ReadonlyContext, RunConfig, Session, State, StreamingMode,
};
pub use error::{ConciergeError, Result};
pub use event::{Event, EventActions, KEY_PREFIX_APP, KEY_PREFIX_TEMP, KEY_PREFIX_USER};
pub use instruction_template::inject_session_state;
pub use model::{
    FinishReason, GenerateContentConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream,
    UsageMetadata,
};
pub use tool::{Tool, ToolContext, required_str};
pub use types::{Content, FunctionResponseData, Part};
