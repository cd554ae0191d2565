//! Decoding of schema-constrained replies.
//!
//! Local reasoning models wrap their answer in `<think>...</think>` and often
//! fence the JSON in markdown, so the reply text is cleaned before decoding.

use serde_json::Value;

const THINK_START: &str = "<think>";
const THINK_END: &str = "</think>";

/// Removes every `<think>...</think>` block. An unterminated block swallows
/// the rest of the text.
pub fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(THINK_START) {
        out.push_str(&rest[..start]);
        match rest[start..].find(THINK_END) {
            Some(end) => rest = &rest[start + end + THINK_END.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (`json`, `JSON`, ...)
    let body = body.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Decodes the JSON value in a model reply, tolerating reasoning blocks,
/// markdown fences and prose around a single top-level object.
pub fn decode_json_reply(text: &str) -> Option<Value> {
    let cleaned = strip_reasoning(text);
    let candidate = strip_fence(&cleaned);
    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&candidate[start..=end]).ok()
}
