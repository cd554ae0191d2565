mod common;

use common::TestContext;
use concierge_agent::LlmAgentBuilder;
use concierge_core::{
    Agent, Content, Event, IncludeContents, InvocationContext, LlmResponse, Part, Result,
};
use concierge_model::MockLlm;
use concierge_tool::FunctionTool;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

async fn collect(agent: &dyn Agent, ctx: Arc<TestContext>) -> Vec<Result<Event>> {
    let stream = agent.run(ctx as Arc<dyn InvocationContext>).await.unwrap();
    stream.collect().await
}

fn events(results: Vec<Result<Event>>) -> Vec<Event> {
    results.into_iter().map(|r| r.unwrap()).collect()
}

#[tokio::test]
async fn instruction_is_templated_and_history_excluded() {
    let model = Arc::new(MockLlm::new("mock").with_text("Two nonstop options."));
    let agent = LlmAgentBuilder::new("summarizer")
        .model(model.clone())
        .instruction("Summarize these flights: {flight_options}")
        .include_contents(IncludeContents::None)
        .output_key("summary")
        .build()
        .unwrap();

    let ctx = Arc::new(
        TestContext::new("LA to Boston on 22 January 2026")
            .with_state("flight_options", json!([{"airline": "Delta"}]))
            .with_history(Content::new("model").with_text("earlier answer")),
    );
    let events = events(collect(&agent, ctx).await);

    let request = &model.requests()[0];
    assert_eq!(request.contents.len(), 2);
    assert_eq!(request.contents[0].role, "system");
    assert_eq!(
        request.contents[0].text(),
        r#"Summarize these flights: [{"airline":"Delta"}]"#
    );
    assert_eq!(request.contents[1].text(), "LA to Boston on 22 January 2026");

    assert_eq!(events.len(), 2);
    assert!(events[0].is_final_text());
    assert_eq!(events[1].actions.state_delta["summary"], "Two nonstop options.");
}

#[tokio::test]
async fn default_include_contents_sends_history() {
    let model = Arc::new(MockLlm::new("mock").with_text("ok"));
    let agent = LlmAgentBuilder::new("assistant").model(model.clone()).build().unwrap();

    let ctx = Arc::new(
        TestContext::new("and tomorrow?").with_history(Content::new("user").with_text("flights today?")),
    );
    collect(&agent, ctx).await;

    let request = &model.requests()[0];
    assert_eq!(request.contents.len(), 2);
    assert_eq!(request.contents[0].text(), "flights today?");
}

#[tokio::test]
async fn tool_results_are_fed_back_to_the_model() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_function_call("lookup_code", json!({"city": "Boston"}))
            .with_text("Boston is BOS."),
    );
    let tool = FunctionTool::new("lookup_code", "Airport code for a city", |_ctx, args| async move {
        assert_eq!(args["city"], "Boston");
        Ok(json!({"code": "BOS"}))
    });
    let agent = LlmAgentBuilder::new("assistant")
        .model(model.clone())
        .tool(Arc::new(tool))
        .build()
        .unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("code for Boston?"))).await);

    // call, function response, final text
    assert_eq!(events.len(), 3);
    let response = events[1].content().unwrap();
    assert_eq!(response.role, "function");
    assert!(matches!(
        &response.parts[0],
        Part::FunctionResponse { function_response, id }
            if function_response.response["code"] == "BOS" && id.as_deref() == Some("call_lookup_code")
    ));
    assert_eq!(events[2].content().unwrap().text(), "Boston is BOS.");

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].tools.contains_key("lookup_code"));
    let last = requests[1].contents.last().unwrap();
    assert_eq!(last.role, "function");
}

#[tokio::test]
async fn skip_summarization_ends_the_turn() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_function_call("store_url", json!({"url": "https://www.kayak.com/flights/A-B/2026-01-22"})),
    );
    let tool = FunctionTool::new("store_url", "Store a url", |ctx, args| async move {
        let mut actions = ctx.actions();
        actions.state_delta.insert("search_url".to_string(), args["url"].clone());
        actions.skip_summarization = true;
        ctx.set_actions(actions);
        Ok(json!({"stored": true}))
    });
    let agent =
        LlmAgentBuilder::new("url_generator").model(model.clone()).tool(Arc::new(tool)).build().unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("go"))).await);

    assert_eq!(model.requests().len(), 1);
    let tool_event = events.last().unwrap();
    assert!(tool_event.actions.skip_summarization);
    assert_eq!(
        tool_event.actions.state_delta["search_url"],
        "https://www.kayak.com/flights/A-B/2026-01-22"
    );
}

#[tokio::test]
async fn tool_errors_and_unknown_tools_become_error_responses() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_function_call("missing_tool", json!({}))
            .with_function_call("failing", json!({}))
            .with_text("Sorry, I could not do that."),
    );
    let failing = FunctionTool::new("failing", "always fails", |_ctx, _args| async move {
        Err(concierge_core::ConciergeError::Tool("browser crashed".to_string()))
    });
    let agent =
        LlmAgentBuilder::new("assistant").model(model).tool(Arc::new(failing)).build().unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("go"))).await);

    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.content())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| match p {
            Part::FunctionResponse { function_response, .. } => {
                function_response.response["error"].as_str().map(str::to_string)
            }
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec!["Tool missing_tool not found", "Tool error: browser crashed"]);
    assert_eq!(events.last().unwrap().content().unwrap().text(), "Sorry, I could not do that.");
}

#[tokio::test]
async fn max_iterations_is_enforced() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_function_call("echo", json!({}))
            .with_function_call("echo", json!({})),
    );
    let echo = FunctionTool::new("echo", "echo", |_ctx, args| async move { Ok(args) });
    let agent = LlmAgentBuilder::new("looper")
        .model(model)
        .tool(Arc::new(echo))
        .max_iterations(2)
        .build()
        .unwrap();

    let results = collect(&agent, Arc::new(TestContext::new("go"))).await;
    let err = results.into_iter().find_map(|r| r.err()).unwrap();
    assert_eq!(err.to_string(), "Agent error: Max iterations (2) exceeded");
}

#[tokio::test]
async fn output_schema_and_temperature_reach_the_request() {
    let model = Arc::new(MockLlm::new("mock").with_text(r#"{"origin":"LA"}"#));
    let agent = LlmAgentBuilder::new("query_parser")
        .model(model.clone())
        .temperature(0.0)
        .output_schema(json!({"type": "object", "properties": {"origin": {"type": "string"}}}))
        .build()
        .unwrap();

    collect(&agent, Arc::new(TestContext::new("LA to Boston"))).await;

    let config = model.requests()[0].config.clone().unwrap();
    assert_eq!(config.temperature, Some(0.0));
    assert_eq!(config.response_schema.unwrap()["type"], "object");
}

#[tokio::test]
async fn streaming_mode_forwards_partials() {
    let mut partial = LlmResponse::new(Content::new("model").with_text("Two "));
    partial.partial = true;
    partial.turn_complete = false;
    let model = Arc::new(MockLlm::new("mock").with_turn(vec![
        partial,
        LlmResponse::new(Content::new("model").with_text("Two flights.")),
    ]));
    let agent = LlmAgentBuilder::new("summarizer").model(model).output_key("summary").build().unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("go").streaming())).await);

    assert!(events[0].llm_response.partial);
    assert!(events[1].is_final_text());
    assert_eq!(events[2].actions.state_delta["summary"], "Two flights.");
}

#[tokio::test]
async fn text_markup_tool_calls_are_executed() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_text(r#"<think>need the code</think><tool_call>{"name": "lookup_code", "arguments": {"city": "LA"}}</tool_call>"#)
            .with_text("LA is LAX."),
    );
    let tool = FunctionTool::new("lookup_code", "Airport code", |_ctx, _args| async move {
        Ok(json!({"code": "LAX"}))
    });
    let agent = LlmAgentBuilder::new("assistant").model(model.clone()).tool(Arc::new(tool)).build().unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("code for LA?"))).await);

    assert_eq!(model.requests().len(), 2);
    assert_eq!(events.last().unwrap().content().unwrap().text(), "LA is LAX.");
}

#[tokio::test]
async fn missing_instruction_variable_is_an_error() {
    let model = Arc::new(MockLlm::new("mock").with_text("unused"));
    let agent = LlmAgentBuilder::new("summarizer")
        .model(model.clone())
        .instruction("Summarize {flight_options}")
        .build()
        .unwrap();

    let results = collect(&agent, Arc::new(TestContext::new("go"))).await;
    assert!(results[0].is_err());
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn structured_output_is_stored_decoded() {
    let model = Arc::new(MockLlm::new("mock").with_text(
        "<think>LA means Los Angeles</think>\n```json\n{\"origin\": \"LA\", \"destination\": \"Boston\"}\n```",
    ));
    let agent = LlmAgentBuilder::new("query_parser")
        .model(model)
        .output_schema(json!({"type": "object"}))
        .output_key("parsed_query")
        .build()
        .unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("LA to Boston"))).await);
    let stored = &events.last().unwrap().actions.state_delta["parsed_query"];
    assert_eq!(stored, &json!({"origin": "LA", "destination": "Boston"}));
}

#[tokio::test]
async fn undecodable_structured_output_is_stored_as_text() {
    let model = Arc::new(MockLlm::new("mock").with_text("I could not tell."));
    let agent = LlmAgentBuilder::new("query_parser")
        .model(model)
        .output_schema(json!({"type": "object"}))
        .output_key("parsed_query")
        .build()
        .unwrap();

    let events = events(collect(&agent, Arc::new(TestContext::new("???"))).await);
    assert_eq!(events.last().unwrap().actions.state_delta["parsed_query"], "I could not tell.");
}
