use crate::structured_output::decode_json_reply;
use crate::tool_call_markup::normalize_content;
use async_stream::stream;
use async_trait::async_trait;
use concierge_core::{
    Agent, ConciergeError, Content, Event, EventActions, EventStream, GenerateContentConfig,
    IncludeContents, InvocationContext, Llm, LlmRequest, Part, ReadonlyContext, Result,
    StreamingMode, Tool, ToolContext,
};
use futures::StreamExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// An agent that drives a chat model, executing tool calls until the model
/// answers in plain text.
pub struct LlmAgent {
    name: String,
    description: String,
    model: Arc<dyn Llm>,
    instruction: Option<String>,
    output_schema: Option<Value>,
    output_key: Option<String>,
    include_contents: IncludeContents,
    generate_config: Option<GenerateContentConfig>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: u32,
}

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("instruction", &self.instruction)
            .field("output_key", &self.output_key)
            .field("tools_count", &self.tools.len())
            .finish()
    }
}

impl LlmAgent {
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }
}

pub struct LlmAgentBuilder {
    name: String,
    description: Option<String>,
    model: Option<Arc<dyn Llm>>,
    instruction: Option<String>,
    output_schema: Option<Value>,
    output_key: Option<String>,
    include_contents: IncludeContents,
    generate_config: Option<GenerateContentConfig>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: u32,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            model: None,
            instruction: None,
            output_schema: None,
            output_key: None,
            include_contents: IncludeContents::Default,
            generate_config: None,
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    /// System instruction; `{key}` placeholders are filled from session state.
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Store the agent's final text in session state under `key`.
    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn include_contents(mut self, include: IncludeContents) -> Self {
        self.include_contents = include;
        self
    }

    pub fn generate_config(mut self, config: GenerateContentConfig) -> Self {
        self.generate_config = Some(config);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generate_config.get_or_insert_with(GenerateContentConfig::default).temperature =
            Some(temperature);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let model =
            self.model.ok_or_else(|| ConciergeError::Agent("Model is required".to_string()))?;

        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name()) {
                return Err(ConciergeError::Agent(format!("Duplicate tool name: {}", tool.name())));
            }
        }

        Ok(LlmAgent {
            name: self.name,
            description: self.description.unwrap_or_default(),
            model,
            instruction: self.instruction,
            output_schema: self.output_schema,
            output_key: self.output_key,
            include_contents: self.include_contents,
            generate_config: self.generate_config,
            tools: self.tools,
            max_iterations: self.max_iterations,
        })
    }
}

// Tool calls see the caller's identity and collect their own actions.
struct AgentToolContext {
    parent_ctx: Arc<dyn InvocationContext>,
    function_call_id: String,
    actions: Mutex<EventActions>,
}

impl AgentToolContext {
    fn new(parent_ctx: Arc<dyn InvocationContext>, function_call_id: String) -> Self {
        Self { parent_ctx, function_call_id, actions: Mutex::new(EventActions::default()) }
    }
}

#[async_trait]
impl ReadonlyContext for AgentToolContext {
    fn invocation_id(&self) -> &str {
        self.parent_ctx.invocation_id()
    }

    fn agent_name(&self) -> &str {
        self.parent_ctx.agent_name()
    }

    fn user_id(&self) -> &str {
        self.parent_ctx.user_id()
    }

    fn app_name(&self) -> &str {
        self.parent_ctx.app_name()
    }

    fn session_id(&self) -> &str {
        self.parent_ctx.session_id()
    }

    fn branch(&self) -> &str {
        self.parent_ctx.branch()
    }

    fn user_content(&self) -> &Content {
        self.parent_ctx.user_content()
    }
}

#[async_trait]
impl ToolContext for AgentToolContext {
    fn function_call_id(&self) -> &str {
        &self.function_call_id
    }

    fn actions(&self) -> EventActions {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn set_actions(&self, actions: EventActions) {
        if let Ok(mut guard) = self.actions.lock() {
            *guard = actions;
        }
    }
}

fn tool_declarations(tools: &[Arc<dyn Tool>]) -> HashMap<String, Value> {
    tools
        .iter()
        .map(|tool| {
            let mut decl = json!({
                "name": tool.name(),
                "description": tool.enhanced_description(),
            });
            if let Some(params) = tool.parameters_schema() {
                decl["parameters"] = params;
            }
            (tool.name().to_string(), decl)
        })
        .collect()
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &[]
    }

    #[concierge_telemetry::instrument(
        skip(self, ctx),
        fields(
            agent.name = %self.name,
            invocation.id = %ctx.invocation_id(),
            session.id = %ctx.session_id()
        )
    )]
    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
        concierge_telemetry::info!(model = self.model.name(), "Starting agent execution");

        let agent_name = self.name.clone();
        let invocation_id = ctx.invocation_id().to_string();
        let model = self.model.clone();
        let tools = self.tools.clone();
        let instruction = self.instruction.clone();
        let output_key = self.output_key.clone();
        let structured_output = self.output_schema.is_some();
        let include_contents = self.include_contents;
        let max_iterations = self.max_iterations;
        let stream_responses = ctx.run_config().streaming_mode == StreamingMode::SSE;
        let declarations = tool_declarations(&self.tools);

        let mut config = self.generate_config.clone();
        if let Some(schema) = &self.output_schema {
            config.get_or_insert_with(GenerateContentConfig::default).response_schema =
                Some(schema.clone());
        }

        let s = stream! {
            let mut contents = Vec::new();

            if let Some(template) = &instruction {
                let text = concierge_core::inject_session_state(ctx.as_ref(), template).await?;
                if !text.is_empty() {
                    contents.push(Content::new("system").with_text(text));
                }
            }

            if include_contents == IncludeContents::Default {
                contents.extend(ctx.session().conversation_history());
            }
            contents.push(ctx.user_content().clone());

            let mut iteration = 0;
            loop {
                iteration += 1;
                if iteration > max_iterations {
                    yield Err(ConciergeError::Agent(format!(
                        "Max iterations ({}) exceeded",
                        max_iterations
                    )));
                    return;
                }

                let mut request = LlmRequest::new(model.name(), contents.clone());
                request.config = config.clone();
                request.tools = declarations.clone();

                let mut response_stream = model.generate_content(request, stream_responses).await?;
                let mut turn_content: Option<Content> = None;

                while let Some(response) = response_stream.next().await {
                    let mut response = match response {
                        Ok(r) => r,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };

                    let mut event = Event::new(&invocation_id).with_author(&agent_name);
                    if response.partial {
                        event.llm_response = response;
                        yield Ok(event);
                        continue;
                    }

                    if let Some(content) = response.content.as_mut() {
                        normalize_content(content);
                        match turn_content.as_mut() {
                            Some(acc) => acc.parts.extend(content.parts.clone()),
                            None => turn_content = Some(content.clone()),
                        }
                    }
                    event.llm_response = response;
                    yield Ok(event);
                }

                let Some(content) = turn_content else {
                    break;
                };
                contents.push(content.clone());

                let calls: Vec<(String, Value, Option<String>)> = content
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::FunctionCall { name, args, id } => {
                            Some((name.clone(), args.clone(), id.clone()))
                        }
                        _ => None,
                    })
                    .collect();

                if calls.is_empty() {
                    if let Some(key) = &output_key {
                        let text = content.text();
                        if !text.is_empty() {
                            let mut state_event = Event::new(&invocation_id).with_author(&agent_name);
                            // schema-constrained replies are stored decoded when they parse
                            let value = structured_output
                                .then(|| decode_json_reply(&text))
                                .flatten()
                                .unwrap_or(Value::String(text));
                            state_event.actions.state_delta.insert(key.clone(), value);
                            yield Ok(state_event);
                        }
                    }
                    break;
                }

                let mut terminate = false;
                for (name, args, id) in calls {
                    let call_id = id.clone().unwrap_or_else(|| format!("{}_{}", invocation_id, name));
                    let (result, actions) = match tools.iter().find(|t| t.name() == name) {
                        Some(tool) => {
                            let tool_ctx: Arc<dyn ToolContext> =
                                Arc::new(AgentToolContext::new(ctx.clone(), call_id.clone()));
                            let span = concierge_telemetry::tool_execute_span(&name);
                            let result = match concierge_telemetry::Instrument::instrument(
                                tool.execute(tool_ctx.clone(), args),
                                span,
                            )
                            .await
                            {
                                Ok(result) => result,
                                Err(e) => {
                                    concierge_telemetry::warn!(tool.name = %name, error = %e, "Tool failed");
                                    json!({ "error": e.to_string() })
                                }
                            };
                            (result, tool_ctx.actions())
                        }
                        None => (
                            json!({ "error": format!("Tool {} not found", name) }),
                            EventActions::default(),
                        ),
                    };

                    let response_content = Content {
                        role: "function".to_string(),
                        parts: vec![Part::function_response(&name, result, id)],
                    };

                    let mut tool_event = Event::new(&invocation_id).with_author(&agent_name);
                    tool_event.actions = actions.clone();
                    tool_event.set_content(response_content.clone());
                    yield Ok(tool_event);

                    if actions.escalate || actions.skip_summarization {
                        terminate = true;
                    }
                    contents.push(response_content);
                }

                if terminate {
                    break;
                }
            }
        };

        Ok(Box::pin(s))
    }
}
