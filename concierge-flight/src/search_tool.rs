use crate::source::FlightSource;
use async_trait::async_trait;
use concierge_core::{ConciergeError, Result, Tool, ToolContext};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub const FLIGHT_OPTIONS_KEY: &str = "flight_options";

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchFlightsArgs {
    /// Kayak search results URL
    url: String,
}

/// Scrapes the options for a search URL into session state under
/// `flight_options`, ending the calling agent's turn.
pub struct SearchFlightsTool {
    source: Arc<dyn FlightSource>,
}

impl SearchFlightsTool {
    pub fn new(source: Arc<dyn FlightSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for SearchFlightsTool {
    fn name(&self) -> &str {
        "search_flights"
    }

    fn description(&self) -> &str {
        "Open a Kayak search URL and extract the top flight options."
    }

    fn is_long_running(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(concierge_tool::json_schema_for::<SearchFlightsArgs>())
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value> {
        let args: SearchFlightsArgs = serde_json::from_value(args)
            .map_err(|e| ConciergeError::Tool(format!("Expected a search url: {}", e)))?;
        let options = self.source.search(&args.url).await?;
        let options = serde_json::to_value(options)?;

        let mut actions = ctx.actions();
        actions.state_delta.insert(FLIGHT_OPTIONS_KEY.to_string(), options.clone());
        actions.skip_summarization = true;
        ctx.set_actions(actions);

        Ok(json!({ "flights": options }))
    }
}
