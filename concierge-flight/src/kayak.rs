use crate::models::ParsedQuery;
use async_trait::async_trait;
use concierge_core::{ConciergeError, Result, Tool, ToolContext};
use serde_json::{Value, json};
use std::sync::Arc;

pub const SEARCH_URL_KEY: &str = "search_url";

const KAYAK_FLIGHTS_BASE: &str = "https://www.kayak.com/flights";

/// Kayak results-page URL for a one-way search. Each part is trimmed and its
/// inner spaces become dashes.
pub fn kayak_search_url(origin: &str, destination: &str, date: &str) -> String {
    let slug = |s: &str| s.trim().replace(' ', "-");
    format!("{}/{}-{}/{}", KAYAK_FLIGHTS_BASE, slug(origin), slug(destination), slug(date))
}

/// Builds the Kayak search URL and stores it in session state under
/// `search_url`, ending the calling agent's turn.
#[derive(Debug, Default)]
pub struct GenerateKayakUrlTool;

impl GenerateKayakUrlTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for GenerateKayakUrlTool {
    fn name(&self) -> &str {
        "generate_kayak_url"
    }

    fn description(&self) -> &str {
        "Generate a Kayak flight search URL."
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(concierge_tool::json_schema_for::<ParsedQuery>())
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value> {
        let query: ParsedQuery = serde_json::from_value(args).map_err(|e| {
            ConciergeError::Tool(format!("Expected origin, destination and date: {}", e))
        })?;
        let url = kayak_search_url(&query.origin, &query.destination, &query.date);
        concierge_telemetry::info!(url = %url, "Kayak URL generated");

        let mut actions = ctx.actions();
        actions.state_delta.insert(SEARCH_URL_KEY.to_string(), Value::String(url.clone()));
        actions.skip_summarization = true;
        ctx.set_actions(actions);

        Ok(json!({ "url": url }))
    }
}
