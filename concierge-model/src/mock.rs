use concierge_core::{
    ConciergeError, Content, Llm, LlmRequest, LlmResponse, LlmResponseStream, Part, Result,
    UsageMetadata,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted model for tests.
///
/// Every `generate_content` call consumes the next scripted turn and records
/// the request it was given. Running out of turns is an error.
pub struct MockLlm {
    name: String,
    turns: Mutex<VecDeque<Vec<LlmResponse>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), turns: Mutex::new(VecDeque::new()), requests: Mutex::new(vec![]) }
    }

    /// Script a turn that streams the given responses in order.
    pub fn with_turn(self, responses: Vec<LlmResponse>) -> Self {
        if let Ok(mut turns) = self.turns.lock() {
            turns.push_back(responses);
        }
        self
    }

    pub fn with_response(self, response: LlmResponse) -> Self {
        self.with_turn(vec![response])
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(LlmResponse::new(Content::new("model").with_text(text)))
    }

    pub fn with_text_and_usage(self, text: impl Into<String>, usage: UsageMetadata) -> Self {
        self.with_response(LlmResponse::new(Content::new("model").with_text(text)).with_usage(usage))
    }

    /// Script a turn where the model calls one tool.
    pub fn with_function_call(self, name: impl Into<String>, args: serde_json::Value) -> Self {
        let name = name.into();
        let mut content = Content::new("model");
        content.parts.push(Part::FunctionCall { name: name.clone(), args, id: Some(format!("call_{name}")) });
        self.with_response(LlmResponse::new(content))
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining_turns(&self) -> usize {
        self.turns.lock().map(|t| t.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(&self, req: LlmRequest, _stream: bool) -> Result<LlmResponseStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req);
        }
        let responses = self
            .turns
            .lock()
            .map_err(|_| ConciergeError::Model("MockLlm lock poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| {
                ConciergeError::Model(format!("MockLlm '{}' has no scripted turn left", self.name))
            })?;

        let stream = async_stream::stream! {
            for response in responses {
                yield Ok(response);
            }
        };
        Ok(Box::pin(stream))
    }
}
