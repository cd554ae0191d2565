use concierge_core::{
    Agent, Content, InvocationContext, ReadonlyContext, RunConfig, Session, State,
    inject_session_state,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// --- Mocks ---

struct MockState {
    data: RwLock<HashMap<String, Value>>,
}

impl MockState {
    fn new() -> Self {
        let mut data = HashMap::new();
        data.insert("origin".to_string(), json!("Los Angeles"));
        data.insert("search_url".to_string(), json!("https://www.kayak.com/flights/LA-Boston/2026-01-22"));
        data.insert("flight_options".to_string(), json!([{"airline": "Delta"}]));
        data.insert("user:home_airport".to_string(), json!("LAX"));
        Self { data: RwLock::new(data) }
    }
}

impl State for MockState {
    fn get(&self, key: &str) -> Option<Value> {
        self.data.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: String, value: Value) {
        self.data.write().unwrap().insert(key, value);
    }

    fn all(&self) -> HashMap<String, Value> {
        self.data.read().unwrap().clone()
    }
}

struct MockSession {
    state: MockState,
}

impl Session for MockSession {
    fn id(&self) -> &str {
        "session-1"
    }
    fn app_name(&self) -> &str {
        "flights"
    }
    fn user_id(&self) -> &str {
        "user-1"
    }
    fn state(&self) -> &dyn State {
        &self.state
    }
    fn conversation_history(&self) -> Vec<Content> {
        Vec::new()
    }
}

struct MockContext {
    session: MockSession,
    content: Content,
    config: RunConfig,
}

impl MockContext {
    fn new() -> Self {
        Self {
            session: MockSession { state: MockState::new() },
            content: Content::new("user").with_text("LA to Boston on 22 January 2026"),
            config: RunConfig::default(),
        }
    }
}

#[async_trait]
impl ReadonlyContext for MockContext {
    fn invocation_id(&self) -> &str {
        "inv-1"
    }
    fn agent_name(&self) -> &str {
        "flight_search"
    }
    fn user_id(&self) -> &str {
        "user-1"
    }
    fn app_name(&self) -> &str {
        "flights"
    }
    fn session_id(&self) -> &str {
        "session-1"
    }
    fn branch(&self) -> &str {
        ""
    }
    fn user_content(&self) -> &Content {
        &self.content
    }
}

#[async_trait]
impl InvocationContext for MockContext {
    fn agent(&self) -> Arc<dyn Agent> {
        unimplemented!()
    }
    fn session(&self) -> &dyn Session {
        &self.session
    }
    fn run_config(&self) -> &RunConfig {
        &self.config
    }
    fn end_invocation(&self) {}
    fn ended(&self) -> bool {
        false
    }
}

// --- Tests ---

#[tokio::test]
async fn test_string_values_are_unquoted() {
    let ctx = MockContext::new();
    let result = inject_session_state(&ctx, "Search flights at {search_url}").await.unwrap();
    assert_eq!(result, "Search flights at https://www.kayak.com/flights/LA-Boston/2026-01-22");
}

#[tokio::test]
async fn test_structured_values_render_as_json() {
    let ctx = MockContext::new();
    let result = inject_session_state(&ctx, "Options: {flight_options}").await.unwrap();
    assert_eq!(result, r#"Options: [{"airline":"Delta"}]"#);
}

#[tokio::test]
async fn test_optional_substitution_missing() {
    let ctx = MockContext::new();
    let result = inject_session_state(&ctx, "Return: {return_date?}").await.unwrap();
    assert_eq!(result, "Return: ");
}

#[tokio::test]
async fn test_missing_variable_error() {
    let ctx = MockContext::new();
    let result = inject_session_state(&ctx, "Date: {date}").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_prefixed_variable() {
    let ctx = MockContext::new();
    let result = inject_session_state(&ctx, "Home: {user:home_airport}").await.unwrap();
    assert_eq!(result, "Home: LAX");
}

#[tokio::test]
async fn test_json_examples_stay_literal() {
    let ctx = MockContext::new();
    let template = r#"Reply like {"origin": "SF", "destination": "New York"} from {origin}"#;
    let result = inject_session_state(&ctx, template).await.unwrap();
    assert_eq!(
        result,
        r#"Reply like {"origin": "SF", "destination": "New York"} from Los Angeles"#
    );
}

#[tokio::test]
async fn test_state_written_through_shared_reference() {
    let ctx = MockContext::new();
    ctx.session().state().set("date".to_string(), json!("2026-01-22"));
    let result = inject_session_state(&ctx, "{origin} on {date}").await.unwrap();
    assert_eq!(result, "Los Angeles on 2026-01-22");
}
