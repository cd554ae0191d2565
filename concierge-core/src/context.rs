use crate::{Agent, types::Content};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ReadonlyContext: Send + Sync {
    fn invocation_id(&self) -> &str;
    fn agent_name(&self) -> &str;
    fn user_id(&self) -> &str;
    fn app_name(&self) -> &str;
    fn session_id(&self) -> &str;
    fn branch(&self) -> &str;
    fn user_content(&self) -> &Content;
}

/// Key/value session state. Writes go through `&self`; implementations own
/// their locking.
pub trait State: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: String, value: Value);
    fn all(&self) -> HashMap<String, Value>;

    fn apply_delta(&self, delta: &HashMap<String, Value>) {
        for (key, value) in delta {
            self.set(key.clone(), value.clone());
        }
    }
}

pub trait Session: Send + Sync {
    fn id(&self) -> &str;
    fn app_name(&self) -> &str;
    fn user_id(&self) -> &str;
    fn state(&self) -> &dyn State;
    fn conversation_history(&self) -> Vec<Content>;
    fn append_to_history(&self, _content: Content) {}
}

#[async_trait]
pub trait InvocationContext: ReadonlyContext {
    fn agent(&self) -> Arc<dyn Agent>;
    fn session(&self) -> &dyn Session;
    fn run_config(&self) -> &RunConfig;
    fn end_invocation(&self);
    fn ended(&self) -> bool;
}

/// Which prior contents an LLM agent sends to its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludeContents {
    /// Only the instruction and the current user turn.
    None,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingMode {
    None,
    SSE,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub streaming_mode: StreamingMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { streaming_mode: StreamingMode::None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    #[derive(Default)]
    struct MapState(RwLock<HashMap<String, Value>>);

    impl State for MapState {
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

    #[test]
    fn test_run_config_default() {
        let config = RunConfig::default();
        assert_eq!(config.streaming_mode, StreamingMode::None);
    }

    #[test]
    fn test_include_contents_default() {
        assert_eq!(IncludeContents::default(), IncludeContents::Default);
    }

    #[test]
    fn test_apply_delta() {
        let state = MapState::default();
        let mut delta = HashMap::new();
        delta.insert("search_url".to_string(), Value::String("https://x".into()));
        delta.insert("parsed_query".to_string(), serde_json::json!({"origin": "LA"}));
        state.apply_delta(&delta);
        assert_eq!(state.all().len(), 2);
        assert_eq!(state.get("search_url"), Some(Value::String("https://x".into())));
    }
}
