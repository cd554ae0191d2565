use crate::{EventActions, ReadonlyContext, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Description sent to the model. Long-running tools get a note telling
    /// the model not to call them again while a result is pending.
    fn enhanced_description(&self) -> String {
        if self.is_long_running() {
            format!(
                "{}\n\nNOTE: This is a long-running operation. Do not call this tool again if it has already returned a pending status.",
                self.description()
            )
        } else {
            self.description().to_string()
        }
    }

    fn is_long_running(&self) -> bool {
        false
    }

    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value>;
}

#[async_trait]
pub trait ToolContext: ReadonlyContext {
    fn function_call_id(&self) -> &str;
    fn actions(&self) -> EventActions;
    fn set_actions(&self, actions: EventActions);
}

/// Reads a required string argument from a tool call.
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| {
        crate::ConciergeError::Tool(format!("missing required string argument '{}'", key))
    })
}
