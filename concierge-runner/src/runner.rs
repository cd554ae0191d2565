use crate::InvocationContext;
use crate::session::{InMemorySession, InMemorySessionService};
use async_stream::stream;
use concierge_core::{Agent, ConciergeError, Content, EventStream, Result, RunConfig, Session};
use concierge_telemetry::Instrument;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RunnerConfig {
    pub app_name: String,
    pub agent: Arc<dyn Agent>,
    /// Shared store; a fresh one is created when absent.
    pub session_service: Option<Arc<InMemorySessionService>>,
    pub run_config: RunConfig,
}

impl RunnerConfig {
    pub fn new(app_name: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        Self { app_name: app_name.into(), agent, session_service: None, run_config: RunConfig::default() }
    }
}

pub struct Runner {
    app_name: String,
    root_agent: Arc<dyn Agent>,
    session_service: Arc<InMemorySessionService>,
    run_config: RunConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        if config.app_name.trim().is_empty() {
            return Err(ConciergeError::Config("app_name must not be empty".to_string()));
        }
        let session_service = config
            .session_service
            .unwrap_or_else(|| Arc::new(InMemorySessionService::new(&config.app_name)));

        Ok(Self {
            app_name: config.app_name,
            root_agent: config.agent,
            session_service,
            run_config: config.run_config,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn session_service(&self) -> &Arc<InMemorySessionService> {
        &self.session_service
    }

    /// Runs one turn of the root agent for `user_content`.
    ///
    /// State deltas are applied as events pass through, so a caller that
    /// stops reading early still sees the state written so far. When the
    /// stream completes the user content is recorded in history ahead of the
    /// turn's replies and `temp:` keys are dropped.
    pub async fn run(
        &self,
        user_id: String,
        session_id: String,
        user_content: Content,
    ) -> Result<EventStream> {
        let session = self.session_service.get_or_create(&user_id, &session_id)?;
        let root_agent = self.root_agent.clone();
        let run_config = self.run_config.clone();
        let app_name = self.app_name.clone();

        let s = stream! {
            let invocation_id = format!("inv-{}", uuid::Uuid::new_v4());
            let history_mark = session.history_len();
            // Workflow agents record their children's output themselves.
            let records_history = root_agent.sub_agents().is_empty();

            let ctx = Arc::new(
                InvocationContext::new(
                    invocation_id.clone(),
                    root_agent.clone(),
                    session.clone(),
                    user_content.clone(),
                )
                .with_run_config(run_config),
            );

            let span = concierge_telemetry::agent_run_span(root_agent.name(), &invocation_id);
            concierge_telemetry::info!(
                app = %app_name,
                session = %session.id(),
                agent = root_agent.name(),
                "Starting turn"
            );

            let mut events = root_agent.run(ctx).instrument(span).await?;
            while let Some(result) = events.next().await {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        finish_turn(&session, history_mark, &user_content);
                        yield Err(e);
                        return;
                    }
                };

                if !event.actions.state_delta.is_empty() {
                    session.state().apply_delta(&event.actions.state_delta);
                }
                if !event.llm_response.partial {
                    if records_history {
                        if let Some(content) = event.content() {
                            session.append_to_history(content.clone());
                        }
                    }
                    session.record_event(event.clone());
                }
                yield Ok(event);
            }

            finish_turn(&session, history_mark, &user_content);
        };

        Ok(Box::pin(s))
    }

    /// Snapshot of a session's state, or `None` for an unknown session.
    pub fn session_state(&self, session_id: &str) -> Option<HashMap<String, Value>> {
        self.session_service.get(session_id).map(|s| s.state().all())
    }
}

fn finish_turn(session: &InMemorySession, history_mark: usize, user_content: &Content) {
    session.insert_history(history_mark, user_content.clone());
    session.in_memory_state().clear_temp();
}
