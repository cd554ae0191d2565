//! Wire types for the chat-completions API and conversions to and from
//! Concierge contents.

use concierge_core::{Content, FinishReason, LlmResponse, Part, UsageMetadata};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the API sends them.
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub delta: Option<DeltaMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeltaMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<DeltaToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeltaToolCall {
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<DeltaFunction>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeltaFunction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<Usage> for UsageMetadata {
    fn from(u: Usage) -> Self {
        UsageMetadata {
            prompt_token_count: u.prompt_tokens as i32,
            candidates_token_count: u.completion_tokens as i32,
            total_token_count: u.total_tokens as i32,
        }
    }
}

pub fn content_to_message(content: &Content) -> Message {
    let role = match content.role.as_str() {
        "model" | "assistant" => "assistant",
        "tool" | "function" => "tool",
        "system" => "system",
        _ => "user",
    };

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();
    let mut tool_call_id = None;

    for part in &content.parts {
        match part {
            Part::Text { text } => text_parts.push(text.clone()),
            Part::FunctionCall { name, args, id } => {
                tool_calls.push(ToolCall {
                    id: id.clone().unwrap_or_else(|| format!("call_{}", tool_calls.len())),
                    call_type: "function".to_string(),
                    function: FunctionCall { name: name.clone(), arguments: args.to_string() },
                });
            }
            Part::FunctionResponse { function_response, id } => {
                tool_call_id = id.clone();
                text_parts.push(function_response.response.to_string());
            }
        }
    }

    Message {
        role: role.to_string(),
        content: if text_parts.is_empty() { None } else { Some(text_parts.join("\n")) },
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
        tool_call_id,
    }
}

/// Tool declarations arrive as `{name, description, parameters}` objects.
pub fn convert_tools(tools: &HashMap<String, Value>) -> Vec<Tool> {
    let mut converted: Vec<Tool> = tools
        .values()
        .filter_map(|decl| {
            let name = decl.get("name")?.as_str()?;
            Some(Tool {
                tool_type: "function".to_string(),
                function: FunctionDef {
                    name: name.to_string(),
                    description: decl
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    parameters: decl
                        .get("parameters")
                        .cloned()
                        .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
                },
            })
        })
        .collect();
    converted.sort_by(|a, b| a.function.name.cmp(&b.function.name));
    converted
}

pub fn response_format(schema: &Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {"name": "response", "schema": schema}
    })
}

fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| json!({}))
}

pub fn from_response(response: &ChatCompletionResponse) -> LlmResponse {
    let choice = response.choices.first();
    let finish_reason =
        choice.and_then(|c| c.finish_reason.as_deref()).map(FinishReason::from_openai);

    let mut parts = Vec::new();
    if let Some(msg) = choice.and_then(|c| c.message.as_ref()) {
        if let Some(text) = msg.content.as_ref().filter(|t| !t.is_empty()) {
            parts.push(Part::Text { text: text.clone() });
        }
        for tc in msg.tool_calls.iter().flatten() {
            parts.push(Part::FunctionCall {
                name: tc.function.name.clone(),
                args: parse_arguments(&tc.function.arguments),
                id: Some(tc.id.clone()),
            });
        }
    }

    LlmResponse {
        content: (!parts.is_empty()).then(|| Content { role: "model".to_string(), parts }),
        usage_metadata: response.usage.map(UsageMetadata::from),
        finish_reason,
        partial: false,
        turn_complete: true,
        error_code: None,
        error_message: None,
    }
}

/// Folds SSE chunks into partial text responses and one final response.
///
/// The final response carries the full text and every tool call, so callers
/// that ignore partials still see the whole turn.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    tool_calls: BTreeMap<u32, (String, String, String)>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl StreamAccumulator {
    /// Absorb one chunk, returning a partial response when it carried text.
    pub fn push(&mut self, chunk: &ChatCompletionResponse) -> Option<LlmResponse> {
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }
        let choice = chunk.choices.first()?;
        if let Some(reason) = &choice.finish_reason {
            self.finish_reason = Some(FinishReason::from_openai(reason));
        }
        let delta = choice.delta.as_ref()?;

        for tc in delta.tool_calls.iter().flatten() {
            let entry = self
                .tool_calls
                .entry(tc.index)
                .or_insert_with(|| (format!("call_{}", tc.index), String::new(), String::new()));
            if let Some(id) = &tc.id {
                entry.0 = id.clone();
            }
            if let Some(func) = &tc.function {
                if let Some(name) = &func.name {
                    entry.1 = name.clone();
                }
                if let Some(args) = &func.arguments {
                    entry.2.push_str(args);
                }
            }
        }

        let text = delta.content.as_ref().filter(|t| !t.is_empty())?;
        self.text.push_str(text);
        Some(LlmResponse {
            content: Some(Content::new("model").with_text(text.clone())),
            usage_metadata: None,
            finish_reason: None,
            partial: true,
            turn_complete: false,
            error_code: None,
            error_message: None,
        })
    }

    pub fn finish(self) -> LlmResponse {
        let mut parts = Vec::new();
        if !self.text.is_empty() {
            parts.push(Part::Text { text: self.text });
        }
        for (_, (id, name, args)) in self.tool_calls {
            parts.push(Part::FunctionCall { name, args: parse_arguments(&args), id: Some(id) });
        }

        LlmResponse {
            content: (!parts.is_empty()).then(|| Content { role: "model".to_string(), parts }),
            usage_metadata: self.usage.map(UsageMetadata::from),
            finish_reason: self.finish_reason.or(Some(FinishReason::Stop)),
            partial: false,
            turn_complete: true,
            error_code: None,
            error_message: None,
        }
    }
}
