//! The four agents of the flight pipeline and the step wrapper that makes
//! tool-driven steps reliable with small local models.

use crate::kayak::GenerateKayakUrlTool;
use crate::models::ParsedQuery;
use crate::search_tool::SearchFlightsTool;
use crate::source::FlightSource;
use async_stream::stream;
use concierge_agent::{Agent, CustomAgent, LlmAgent, LlmAgentBuilder};
use concierge_core::{
    ConciergeError, Event, EventStream, IncludeContents, InvocationContext, Llm, Part, Result,
};
use futures::StreamExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub const QUERY_KEY: &str = "query";
pub const PARSED_QUERY_KEY: &str = "parsed_query";
pub const SUMMARY_KEY: &str = "summary";

struct Persona {
    role: &'static str,
    goal: &'static str,
    backstory: &'static str,
}

const QUERY_PARSER: Persona = Persona {
    role: "Query Parser",
    goal: "Extract structured flight search info from a user query",
    backstory: "Expert at parsing travel queries into origin, destination, and date",
};

const FLIGHT_SEARCHER: Persona = Persona {
    role: "Flight Search Agent",
    goal: "Generate a Kayak URL and extract the top 5 flights using available tools",
    backstory: "Expert at using Kayak and extracting flight info",
};

const SUMMARIZER: Persona = Persona {
    role: "Summarization Agent",
    goal: "Summarize flight options in a clear, user-friendly way",
    backstory: "Travel assistant",
};

fn instruction(persona: &Persona, task: &str, expected_output: &str) -> String {
    format!(
        "You are the {}. {}.\n{}.\n\nTask: {}\n\nExpected output: {}",
        persona.role, persona.goal, persona.backstory, task, expected_output
    )
}

pub fn query_parser(model: Arc<dyn Llm>) -> Result<LlmAgent> {
    LlmAgentBuilder::new("query_parser")
        .description(QUERY_PARSER.goal)
        .model(model)
        .instruction(instruction(
            &QUERY_PARSER,
            "Parse this query: {query}",
            "origin, destination, date. Reply with a single JSON object with the keys \
             \"origin\", \"destination\" and \"date\" (YYYY-MM-DD) and nothing else.",
        ))
        .output_schema(concierge_tool::json_schema_for::<ParsedQuery>())
        .output_key(PARSED_QUERY_KEY)
        .include_contents(IncludeContents::None)
        .temperature(0.0)
        .build()
}

pub fn url_generator(model: Arc<dyn Llm>) -> Result<LlmAgent> {
    LlmAgentBuilder::new("url_generator")
        .description(FLIGHT_SEARCHER.goal)
        .model(model)
        .instruction(instruction(
            &FLIGHT_SEARCHER,
            "Generate a Kayak URL for the flight search.\nParsed query: {parsed_query?}\n\
             Call the generate_kayak_url tool with the origin, destination and date.",
            "url",
        ))
        .tool(Arc::new(GenerateKayakUrlTool::new()))
        .include_contents(IncludeContents::None)
        .temperature(0.0)
        .build()
}

pub fn flight_searcher(
    model: Arc<dyn Llm>,
    source: Arc<dyn FlightSource>,
    max_results: usize,
) -> Result<LlmAgent> {
    LlmAgentBuilder::new("flight_searcher")
        .description(FLIGHT_SEARCHER.goal)
        .model(model)
        .instruction(instruction(
            &FLIGHT_SEARCHER,
            "Search flights on Kayak using the URL.\nURL: {search_url}\n\
             Call the search_flights tool with this url.",
            &format!(
                "A list of {} flight options with airline, price, duration, and stops",
                max_results
            ),
        ))
        .tool(Arc::new(SearchFlightsTool::new(source)))
        .include_contents(IncludeContents::None)
        .temperature(0.0)
        .build()
}

pub fn summarizer(model: Arc<dyn Llm>) -> Result<LlmAgent> {
    LlmAgentBuilder::new("summarizer")
        .description(SUMMARIZER.goal)
        .model(model)
        .instruction(instruction(
            &SUMMARIZER,
            "Summarize the flight options in a clear, user-friendly way.\n\
             Flight options: {flight_options}",
            "A concise summary comparing all flight options",
        ))
        .output_key(SUMMARY_KEY)
        .include_contents(IncludeContents::None)
        .build()
}

/// Runs `agent`, then writes `key` with `fallback` if the agent finished
/// without setting it. Small models often answer in prose instead of calling
/// the tool that would have set it.
///
/// When one of the agent's own tools ran and failed, the step fails with
/// the tool's error and the fallback does not run.
pub fn ensure_state<F, Fut>(agent: LlmAgent, key: &'static str, fallback: F) -> Result<CustomAgent>
where
    F: Fn(Arc<dyn InvocationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    let name = agent.name().to_string();
    let tool_names: Vec<String> = agent.tools().iter().map(|t| t.name().to_string()).collect();
    let description = agent.description().to_string();
    let agent = Arc::new(agent);
    let fallback = Arc::new(fallback);

    CustomAgent::builder(name.clone())
        .description(description)
        .handler(move |ctx| {
            let agent = agent.clone();
            let fallback = fallback.clone();
            let name = name.clone();
            let tool_names = tool_names.clone();
            async move {
                let mut events = agent.run(ctx.clone()).await?;
                let s = stream! {
                    let mut written = false;
                    let mut tool_error = None;
                    while let Some(result) = events.next().await {
                        let event = result?;
                        written |= event.actions.state_delta.contains_key(key);
                        if let Some(message) = failed_tool_call(&event, &tool_names) {
                            tool_error = Some(message);
                        }
                        yield Ok(event);
                    }

                    if written || ctx.session().state().get(key).is_some() {
                        return;
                    }
                    if let Some(message) = tool_error {
                        yield Err(ConciergeError::Agent(format!("{}: {}", name, message)));
                        return;
                    }
                    concierge_telemetry::warn!(agent = %name, key, "Agent left no output, using fallback");
                    let value = fallback(ctx.clone()).await?;
                    let mut event = Event::new(ctx.invocation_id()).with_author(&name);
                    event.actions.state_delta.insert(key.to_string(), value);
                    yield Ok(event);
                };
                Ok::<_, ConciergeError>(Box::pin(s) as EventStream)
            }
        })
        .build()
}

/// The error text of a function response reporting that one of `tools`
/// ran and failed. Calls to unknown tools never ran and do not count.
fn failed_tool_call(event: &Event, tools: &[String]) -> Option<String> {
    event.content()?.parts.iter().find_map(|part| match part {
        Part::FunctionResponse { function_response, .. }
            if tools.iter().any(|t| *t == function_response.name) =>
        {
            function_response.response.get("error")?.as_str().map(str::to_string)
        }
        _ => None,
    })
}
