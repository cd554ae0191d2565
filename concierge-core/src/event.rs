use crate::model::LlmResponse;
use crate::types::Content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// State scope prefixes
pub const KEY_PREFIX_APP: &str = "app:";
pub const KEY_PREFIX_TEMP: &str = "temp:";
pub const KEY_PREFIX_USER: &str = "user:";

/// A single step emitted by an agent while it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub invocation_id: String,
    pub branch: String,
    pub author: String,
    #[serde(flatten)]
    pub llm_response: LlmResponse,
    pub actions: EventActions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    pub state_delta: HashMap<String, serde_json::Value>,
    /// Ends the emitting agent's turn without another model call.
    pub skip_summarization: bool,
    pub escalate: bool,
}

impl Event {
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            invocation_id: invocation_id.into(),
            branch: String::new(),
            author: String::new(),
            llm_response: LlmResponse::default(),
            actions: EventActions::default(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn content(&self) -> Option<&Content> {
        self.llm_response.content.as_ref()
    }

    pub fn set_content(&mut self, content: Content) {
        self.llm_response.content = Some(content);
    }

    /// True for complete, user-visible text: not partial, no tool traffic.
    pub fn is_final_text(&self) -> bool {
        !self.llm_response.partial
            && self.content().is_some_and(|c| {
                c.role != "function" && c.function_calls().next().is_none() && !c.text().is_empty()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Part;

    #[test]
    fn test_event_creation() {
        let event = Event::new("inv-123").with_author("query_parser");
        assert_eq!(event.invocation_id, "inv-123");
        assert_eq!(event.author, "query_parser");
        assert!(!event.id.is_empty());
    }

    #[test]
    fn test_event_actions_default() {
        let actions = EventActions::default();
        assert!(actions.state_delta.is_empty());
        assert!(!actions.skip_summarization);
        assert!(!actions.escalate);
    }

    #[test]
    fn test_final_text_detection() {
        let mut event = Event::new("inv");
        assert!(!event.is_final_text());

        event.set_content(Content::new("model").with_text("3 flights found"));
        assert!(event.is_final_text());

        event.llm_response.partial = true;
        assert!(!event.is_final_text());

        let mut call = Event::new("inv");
        call.set_content(Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                name: "search_flights".to_string(),
                args: serde_json::json!({}),
                id: None,
            }],
        });
        assert!(!call.is_final_text());
    }
}
