use async_stream::stream;
use async_trait::async_trait;
use concierge_core::{Agent, ConciergeError, EventStream, InvocationContext, Result};
use futures::StreamExt;
use std::sync::Arc;

/// Default maximum iterations for LoopAgent when none is specified.
pub const DEFAULT_LOOP_MAX_ITERATIONS: u32 = 1000;

/// Runs sub-agents in order, repeatedly, until `max_iterations` passes or a
/// sub-agent escalates.
///
/// Every event's state delta is written to the session before the next event
/// is produced, and every complete content is appended to the session
/// history, so later sub-agents see what earlier ones did.
pub struct LoopAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    max_iterations: u32,
}

impl LoopAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            sub_agents,
            max_iterations: DEFAULT_LOOP_MAX_ITERATIONS,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }
}

#[async_trait]
impl Agent for LoopAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &self.sub_agents
    }

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
        if self.max_iterations == 0 {
            return Err(ConciergeError::Agent(format!(
                "{}: max_iterations must be at least 1",
                self.name
            )));
        }

        let sub_agents = self.sub_agents.clone();
        let max_iterations = self.max_iterations;
        let agent_name = self.name.clone();

        let s = stream! {
            let mut remaining = max_iterations;

            'outer: loop {
                for agent in &sub_agents {
                    if ctx.ended() {
                        break 'outer;
                    }
                    concierge_telemetry::debug!(parent = %agent_name, agent = agent.name(), "Running sub-agent");
                    let mut events = agent.run(ctx.clone()).await?;
                    let mut escalated = false;

                    while let Some(result) = events.next().await {
                        let event = result?;
                        if !event.actions.state_delta.is_empty() {
                            ctx.session().state().apply_delta(&event.actions.state_delta);
                        }
                        if !event.llm_response.partial {
                            if let Some(content) = event.content() {
                                ctx.session().append_to_history(content.clone());
                            }
                        }
                        escalated |= event.actions.escalate;
                        yield Ok(event);
                    }

                    if escalated {
                        break 'outer;
                    }
                }

                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
        };

        Ok(Box::pin(s))
    }
}
