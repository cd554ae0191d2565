use crate::error::{FlightError, Result};
use concierge_agent::structured_output::{decode_json_reply, strip_reasoning};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decodes a model reply into `T`, skipping `<think>` blocks, markdown
/// fences and any prose around the JSON object.
pub fn parse_llm_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = decode_json_reply(text).ok_or_else(|| {
        let shown = strip_reasoning(text);
        FlightError::Parse(if shown.is_empty() { "empty reply".to_string() } else { shown })
    })?;
    decode_value(value)
}

/// Reads a state value that is either already-decoded JSON or reply text.
pub fn decode_state_value<T: DeserializeOwned>(value: &Value) -> Result<T> {
    match value {
        Value::String(text) => parse_llm_json(text),
        other => decode_value(other.clone()),
    }
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| FlightError::Parse(e.to_string()))
}
