use async_trait::async_trait;
use concierge_core::{
    Content, ConciergeError, EventActions, ReadonlyContext, Tool, ToolContext, required_str,
};
use concierge_tool::FunctionTool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};

struct MockToolContext {
    actions: Mutex<EventActions>,
    content: Content,
}

impl MockToolContext {
    fn new() -> Self {
        Self { actions: Mutex::new(EventActions::default()), content: Content::new("user") }
    }
}

#[async_trait]
impl ReadonlyContext for MockToolContext {
    fn invocation_id(&self) -> &str { "inv-1" }
    fn agent_name(&self) -> &str { "url_generator" }
    fn user_id(&self) -> &str { "user-1" }
    fn app_name(&self) -> &str { "flights" }
    fn session_id(&self) -> &str { "session-1" }
    fn branch(&self) -> &str { "" }
    fn user_content(&self) -> &Content { &self.content }
}

#[async_trait]
impl ToolContext for MockToolContext {
    fn function_call_id(&self) -> &str { "call-1" }
    fn actions(&self) -> EventActions { self.actions.lock().unwrap().clone() }
    fn set_actions(&self, actions: EventActions) { *self.actions.lock().unwrap() = actions; }
}

#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
struct RouteParams {
    /// Departure city
    origin: String,
    destination: String,
}

#[tokio::test]
async fn test_function_tool_basic() {
    let tool = FunctionTool::new("route", "Joins origin and destination", |_ctx, args| async move {
        let origin = required_str(&args, "origin")?;
        let destination = required_str(&args, "destination")?;
        Ok(json!(format!("{origin}-{destination}")))
    });

    assert_eq!(tool.name(), "route");
    assert_eq!(tool.description(), "Joins origin and destination");
    assert!(!tool.is_long_running());
    assert!(tool.parameters_schema().is_none());

    let ctx = Arc::new(MockToolContext::new()) as Arc<dyn ToolContext>;
    let result = tool.execute(ctx, json!({"origin": "LA", "destination": "Boston"})).await.unwrap();
    assert_eq!(result, json!("LA-Boston"));
}

#[tokio::test]
async fn test_function_tool_with_schema() {
    let tool = FunctionTool::new("route", "Joins origin and destination", |_ctx, args| async move {
        Ok(args)
    })
    .with_parameters_schema::<RouteParams>();

    let schema = tool.parameters_schema().unwrap();
    assert_eq!(schema["properties"]["origin"]["type"], "string");
    assert_eq!(schema["properties"]["origin"]["description"], "Departure city");
    assert!(schema["properties"]["destination"].is_object());
}

#[tokio::test]
async fn test_function_tool_missing_argument_errors() {
    let tool = FunctionTool::new("route", "needs origin", |_ctx, args| async move {
        Ok(json!(required_str(&args, "origin")?))
    });

    let ctx = Arc::new(MockToolContext::new()) as Arc<dyn ToolContext>;
    let err = tool.execute(ctx, json!({})).await.unwrap_err();
    assert!(matches!(err, ConciergeError::Tool(_)));
}

#[tokio::test]
async fn test_function_tool_can_write_state_delta() {
    let tool = FunctionTool::new("remember", "Stores the url", |ctx, args| async move {
        let mut actions = ctx.actions();
        actions.state_delta.insert("search_url".to_string(), args["url"].clone());
        actions.skip_summarization = true;
        ctx.set_actions(actions);
        Ok(json!({"stored": true}))
    });

    let ctx = Arc::new(MockToolContext::new());
    tool.execute(ctx.clone(), json!({"url": "https://www.kayak.com/flights/A-B/2026-01-22"}))
        .await
        .unwrap();

    let actions = ctx.actions();
    assert!(actions.skip_summarization);
    assert_eq!(actions.state_delta["search_url"], "https://www.kayak.com/flights/A-B/2026-01-22");
}

#[tokio::test]
async fn test_function_tool_long_running() {
    let tool = FunctionTool::new("scrape", "Scrape results", |_ctx, _args| async move {
        Ok(json!("done"))
    })
    .with_long_running(true);

    assert!(tool.is_long_running());
    assert!(tool.enhanced_description().contains("long-running"));
}
