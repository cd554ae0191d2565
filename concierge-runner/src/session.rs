use concierge_core::{
    ConciergeError, Content, Event, KEY_PREFIX_TEMP, Result, Session, State,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type StateMap = HashMap<String, Value>;

#[derive(Default)]
pub struct InMemoryState {
    values: RwLock<StateMap>,
}

impl InMemoryState {
    /// Drops every `temp:` key. Called once per turn.
    pub fn clear_temp(&self) {
        self.values.write().unwrap().retain(|k, _| !k.starts_with(KEY_PREFIX_TEMP));
    }
}

impl State for InMemoryState {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: String, value: Value) {
        self.values.write().unwrap().insert(key, value);
    }

    fn all(&self) -> HashMap<String, Value> {
        self.values.read().unwrap().clone()
    }
}

pub struct InMemorySession {
    id: String,
    app_name: String,
    user_id: String,
    state: InMemoryState,
    history: RwLock<Vec<Content>>,
    events: RwLock<Vec<Event>>,
}

impl InMemorySession {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            state: InMemoryState::default(),
            history: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn in_memory_state(&self) -> &InMemoryState {
        &self.state
    }

    pub fn history_len(&self) -> usize {
        self.history.read().unwrap().len()
    }

    pub(crate) fn insert_history(&self, index: usize, content: Content) {
        let mut history = self.history.write().unwrap();
        let index = index.min(history.len());
        history.insert(index, content);
    }

    pub(crate) fn record_event(&self, mut event: Event) {
        event.actions.state_delta.retain(|k, _| !k.starts_with(KEY_PREFIX_TEMP));
        self.events.write().unwrap().push(event);
    }

    /// Complete (non-partial) events recorded so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.read().unwrap().clone()
    }
}

impl Session for InMemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn state(&self) -> &dyn State {
        &self.state
    }

    fn conversation_history(&self) -> Vec<Content> {
        self.history.read().unwrap().clone()
    }

    fn append_to_history(&self, content: Content) {
        self.history.write().unwrap().push(content);
    }
}

/// Process-local session store for one application.
pub struct InMemorySessionService {
    app_name: String,
    sessions: RwLock<HashMap<String, Arc<InMemorySession>>>,
}

impl InMemorySessionService {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self { app_name: app_name.into(), sessions: RwLock::new(HashMap::new()) }
    }

    /// Creates a session. A missing id gets a fresh UUID.
    pub fn create(
        &self,
        user_id: &str,
        session_id: Option<String>,
        state: StateMap,
    ) -> Result<Arc<InMemorySession>> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut sessions = self.sessions.write().unwrap();
        if sessions.contains_key(&session_id) {
            return Err(ConciergeError::Session(format!("session {session_id} already exists")));
        }

        let session = Arc::new(InMemorySession::new(&self.app_name, user_id, &session_id));
        session.state.apply_delta(&state);
        session.state.clear_temp();
        sessions.insert(session_id, session.clone());
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<InMemorySession>> {
        self.sessions.read().unwrap().get(session_id).cloned()
    }

    /// Returns the session, creating an empty one on first use. A session
    /// id belongs to the user that created it.
    pub fn get_or_create(&self, user_id: &str, session_id: &str) -> Result<Arc<InMemorySession>> {
        if let Some(session) = self.get(session_id) {
            if session.user_id() != user_id {
                return Err(ConciergeError::Session(format!(
                    "session {session_id} belongs to another user"
                )));
            }
            return Ok(session);
        }
        match self.create(user_id, Some(session_id.to_string()), StateMap::new()) {
            Ok(session) => Ok(session),
            // lost a race with another creator
            Err(_) => self
                .get(session_id)
                .ok_or_else(|| ConciergeError::Session(format!("session {session_id} not found"))),
        }
    }

    pub fn delete(&self, session_id: &str) {
        self.sessions.write().unwrap().remove(session_id);
    }

    pub fn list(&self, user_id: &str) -> Vec<Arc<InMemorySession>> {
        let sessions = self.sessions.read().unwrap();
        let mut result: Vec<_> =
            sessions.values().filter(|s| s.user_id() == user_id).cloned().collect();
        result.sort_by(|a, b| a.id().cmp(b.id()));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_drops_temp_keys_from_initial_state() {
        let service = InMemorySessionService::new("concierge");
        let mut state = StateMap::new();
        state.insert("origin".to_string(), json!("LA"));
        state.insert("temp:scratch".to_string(), json!(1));

        let session = service.create("u1", Some("s1".to_string()), state).unwrap();
        assert_eq!(session.state().get("origin"), Some(json!("LA")));
        assert!(session.state().get("temp:scratch").is_none());
    }

    #[test]
    fn duplicate_session_id_is_rejected() {
        let service = InMemorySessionService::new("concierge");
        service.create("u1", Some("s1".to_string()), StateMap::new()).unwrap();
        assert!(service.create("u1", Some("s1".to_string()), StateMap::new()).is_err());
    }

    #[test]
    fn get_or_create_is_scoped_to_the_owner() {
        let service = InMemorySessionService::new("concierge");
        let first = service.get_or_create("u1", "s1").unwrap();
        let again = service.get_or_create("u1", "s1").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(service.get_or_create("u2", "s1").is_err());
    }

    #[test]
    fn generated_ids_are_unique() {
        let service = InMemorySessionService::new("concierge");
        let a = service.create("u1", None, StateMap::new()).unwrap();
        let b = service.create("u1", None, StateMap::new()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(service.list("u1").len(), 2);
        assert!(service.list("u2").is_empty());
    }

    #[test]
    fn insert_history_clamps_the_index() {
        let session = InMemorySession::new("app", "u1", "s1");
        session.append_to_history(Content::new("model").with_text("b"));
        session.insert_history(0, Content::new("user").with_text("a"));
        session.insert_history(99, Content::new("model").with_text("c"));
        let texts: Vec<String> = session.conversation_history().iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn recorded_events_do_not_keep_temp_deltas() {
        let session = InMemorySession::new("app", "u1", "s1");
        let mut event = Event::new("inv-1");
        event.actions.state_delta.insert("temp:raw".to_string(), json!("x"));
        event.actions.state_delta.insert("summary".to_string(), json!("y"));
        session.record_event(event);

        let events = session.events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].actions.state_delta.contains_key("temp:raw"));
    }
}
