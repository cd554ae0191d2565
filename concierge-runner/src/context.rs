use crate::session::InMemorySession;
use async_trait::async_trait;
use concierge_core::{
    Agent, Content, InvocationContext as InvocationContextTrait, ReadonlyContext, RunConfig,
    Session,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct InvocationContext {
    invocation_id: String,
    agent: Arc<dyn Agent>,
    session: Arc<InMemorySession>,
    branch: String,
    user_content: Content,
    run_config: RunConfig,
    ended: Arc<AtomicBool>,
}

impl InvocationContext {
    pub fn new(
        invocation_id: String,
        agent: Arc<dyn Agent>,
        session: Arc<InMemorySession>,
        user_content: Content,
    ) -> Self {
        Self {
            invocation_id,
            agent,
            session,
            branch: String::new(),
            user_content,
            run_config: RunConfig::default(),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_branch(mut self, branch: String) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_run_config(mut self, config: RunConfig) -> Self {
        self.run_config = config;
        self
    }
}

#[async_trait]
impl ReadonlyContext for InvocationContext {
    fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    fn agent_name(&self) -> &str {
        self.agent.name()
    }

    fn user_id(&self) -> &str {
        self.session.user_id()
    }

    fn app_name(&self) -> &str {
        self.session.app_name()
    }

    fn session_id(&self) -> &str {
        self.session.id()
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn user_content(&self) -> &Content {
        &self.user_content
    }
}

#[async_trait]
impl InvocationContextTrait for InvocationContext {
    fn agent(&self) -> Arc<dyn Agent> {
        self.agent.clone()
    }

    fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    fn end_invocation(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }
}
