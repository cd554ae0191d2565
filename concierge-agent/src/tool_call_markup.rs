//! Text-encoded tool calls.
//!
//! Models served without native function calling (deepseek-r1 on Ollama, for
//! one) are prompted to emit calls inline. Two encodings are recognised:
//!
//! ```text
//! <tool_call>{"name": "search_flights", "arguments": {"url": "https://..."}}</tool_call>
//!
//! <tool_call>
//! search_flights
//! <arg_key>url</arg_key>
//! <arg_value>https://...</arg_value>
//! </tool_call>
//! ```

use concierge_core::{Content, Part};
use serde_json::{Map, Value};

const TOOL_CALL_START: &str = "<tool_call>";
const TOOL_CALL_END: &str = "</tool_call>";

/// Rewrite text parts so that inline tool-call markup becomes
/// `Part::FunctionCall`. Unparseable blocks stay as text.
pub fn normalize_content(content: &mut Content) {
    let parts = std::mem::take(&mut content.parts);
    content.parts = parts
        .into_iter()
        .flat_map(|part| match part {
            Part::Text { text } => split_text(text),
            other => vec![other],
        })
        .collect();
}

fn split_text(text: String) -> Vec<Part> {
    if !text.contains(TOOL_CALL_START) {
        return vec![Part::Text { text }];
    }

    let mut parts = Vec::new();
    let mut remainder = text.as_str();

    while let Some(start) = remainder.find(TOOL_CALL_START) {
        let (before, tagged) = remainder.split_at(start);
        push_text(&mut parts, before);

        let body_start = &tagged[TOOL_CALL_START.len()..];
        let Some(end) = body_start.find(TOOL_CALL_END) else {
            push_text(&mut parts, tagged);
            remainder = "";
            break;
        };

        let block = &body_start[..end];
        match parse_block(block, parts.len()) {
            Some(call) => parts.push(call),
            None => push_text(&mut parts, &format!("{TOOL_CALL_START}{block}{TOOL_CALL_END}")),
        }
        remainder = &body_start[end + TOOL_CALL_END.len()..];
    }

    push_text(&mut parts, remainder);
    parts
}

fn push_text(parts: &mut Vec<Part>, text: &str) {
    if !text.trim().is_empty() {
        parts.push(Part::Text { text: text.to_string() });
    }
}

fn parse_block(block: &str, index: usize) -> Option<Part> {
    let trimmed = block.trim();
    if trimmed.starts_with('{') {
        parse_json_block(trimmed, index)
    } else {
        parse_key_value_block(trimmed, index)
    }
}

fn parse_json_block(block: &str, index: usize) -> Option<Part> {
    let value: Value = serde_json::from_str(block).ok()?;
    let name = value.get("name")?.as_str()?.to_string();
    let args = match value.get("arguments").or_else(|| value.get("args")) {
        // Some models double-encode the arguments as a JSON string.
        Some(Value::String(raw)) => serde_json::from_str(raw).ok()?,
        Some(args @ Value::Object(_)) => args.clone(),
        None => Value::Object(Map::new()),
        Some(_) => return None,
    };
    Some(Part::FunctionCall { name, args, id: Some(format!("markup_{index}")) })
}

fn parse_key_value_block(block: &str, index: usize) -> Option<Part> {
    let mut lines = block.lines();
    let name = lines.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let rest = lines.collect::<Vec<_>>().join("\n");
    let mut slice = rest.as_str();
    let mut args = Map::new();

    loop {
        slice = slice.trim_start();
        let Some(after_key_tag) = slice.strip_prefix("<arg_key>") else { break };
        let key_end = after_key_tag.find("</arg_key>")?;
        let key = after_key_tag[..key_end].trim().to_string();

        let after_key = after_key_tag[key_end + "</arg_key>".len()..].trim_start();
        let after_value_tag = after_key.strip_prefix("<arg_value>")?;
        let value_end = after_value_tag.find("</arg_value>")?;
        let raw = after_value_tag[..value_end].trim();
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

        args.insert(key, value);
        slice = &after_value_tag[value_end + "</arg_value>".len()..];
    }

    if args.is_empty() {
        return None;
    }
    Some(Part::FunctionCall {
        name: name.to_string(),
        args: Value::Object(args),
        id: Some(format!("markup_{index}")),
    })
}
