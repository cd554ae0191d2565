//! # concierge-tool
//!
//! Tools that Concierge LLM agents can call.
//!
//! - [`FunctionTool`] - wrap an async closure as a tool
//! - [`json_schema_for`] - derive a provider-friendly JSON schema from a type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use concierge_tool::FunctionTool;
//! use concierge_core::{ToolContext, Result, required_str};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! async fn airport_code(_ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value> {
//!     let city = required_str(&args, "city")?;
//!     Ok(json!({ "city": city, "code": "BOS" }))
//! }
//!
//! let tool = FunctionTool::new("airport_code", "Look up an airport code", airport_code);
//! ```

mod function_tool;
mod schema;

pub use concierge_core::{Tool, ToolContext};
pub use function_tool::FunctionTool;
pub use schema::json_schema_for;
