#![allow(dead_code)]

use async_trait::async_trait;
use concierge_core::{
    Agent, Content, InvocationContext, ReadonlyContext, RunConfig, Session, State, StreamingMode,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Default)]
pub struct TestState(RwLock<HashMap<String, Value>>);

impl State for TestState {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.read().unwrap().get(key).cloned()
    }
    fn set(&self, key: String, value: Value) {
        self.0.write().unwrap().insert(key, value);
    }
    fn all(&self) -> HashMap<String, Value> {
        self.0.read().unwrap().clone()
    }
}

#[derive(Default)]
pub struct TestSession {
    pub state: TestState,
    pub history: Mutex<Vec<Content>>,
}

impl Session for TestSession {
    fn id(&self) -> &str { "test-session" }
    fn app_name(&self) -> &str { "test-app" }
    fn user_id(&self) -> &str { "test-user" }
    fn state(&self) -> &dyn State { &self.state }
    fn conversation_history(&self) -> Vec<Content> { self.history.lock().unwrap().clone() }
    fn append_to_history(&self, content: Content) { self.history.lock().unwrap().push(content); }
}

pub struct TestContext {
    pub content: Content,
    pub config: RunConfig,
    pub session: TestSession,
}

impl TestContext {
    pub fn new(message: &str) -> Self {
        Self {
            content: Content::new("user").with_text(message),
            config: RunConfig::default(),
            session: TestSession::default(),
        }
    }

    pub fn streaming(mut self) -> Self {
        self.config.streaming_mode = StreamingMode::SSE;
        self
    }

    pub fn with_state(self, key: &str, value: Value) -> Self {
        self.session.state.set(key.to_string(), value);
        self
    }

    pub fn with_history(self, content: Content) -> Self {
        self.session.append_to_history(content);
        self
    }
}

#[async_trait]
impl ReadonlyContext for TestContext {
    fn invocation_id(&self) -> &str { "test-invocation" }
    fn agent_name(&self) -> &str { "test-agent" }
    fn user_id(&self) -> &str { "test-user" }
    fn app_name(&self) -> &str { "test-app" }
    fn session_id(&self) -> &str { "test-session" }
    fn branch(&self) -> &str { "" }
    fn user_content(&self) -> &Content { &self.content }
}

#[async_trait]
impl InvocationContext for TestContext {
    fn agent(&self) -> Arc<dyn Agent> { unimplemented!() }
    fn session(&self) -> &dyn Session { &self.session }
    fn run_config(&self) -> &RunConfig { &self.config }
    fn end_invocation(&self) {}
    fn ended(&self) -> bool { false }
}
