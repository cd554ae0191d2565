use crate::agents::{
    PARSED_QUERY_KEY, QUERY_KEY, SUMMARY_KEY, ensure_state, flight_searcher, query_parser,
    summarizer, url_generator,
};
use crate::config::FlightConfig;
use crate::error::{FlightError, Result};
use crate::json::decode_state_value;
use crate::kayak::{SEARCH_URL_KEY, kayak_search_url};
use crate::models::{FlightOption, FlightReport, ParsedQuery};
use crate::search_tool::FLIGHT_OPTIONS_KEY;
use crate::source::{FlightSource, KayakBrowserSource};
use concierge_agent::SequentialAgent;
use concierge_agent::structured_output::strip_reasoning;
use concierge_core::{Agent, Content, InvocationContext, Llm, Session};
use concierge_model::model_from_id;
use concierge_runner::{Runner, RunnerConfig};
use concierge_telemetry::Instrument;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const APP_NAME: &str = "flight-search";
const USER_ID: &str = "traveller";

/// The chat models behind each step.
#[derive(Clone)]
pub struct FlightModels {
    pub parser: Arc<dyn Llm>,
    pub search: Arc<dyn Llm>,
    pub summary: Arc<dyn Llm>,
}

impl FlightModels {
    pub fn from_config(config: &FlightConfig) -> Result<Self> {
        let settings = config.model_settings();
        Ok(Self {
            parser: model_from_id(&config.parser_model, &settings)?,
            search: model_from_id(&config.search_model, &settings)?,
            summary: model_from_id(&config.summary_model, &settings)?,
        })
    }

    /// One model for every step.
    pub fn shared(model: Arc<dyn Llm>) -> Self {
        Self { parser: model.clone(), search: model.clone(), summary: model }
    }
}

/// Query Parser → URL generation → scraping → summary, run as one
/// sequential workflow per search.
pub struct FlightPipeline {
    runner: Runner,
}

impl FlightPipeline {
    pub fn new(
        models: FlightModels,
        source: Arc<dyn FlightSource>,
        max_results: usize,
    ) -> Result<Self> {
        let url_step =
            ensure_state(url_generator(models.search.clone())?, SEARCH_URL_KEY, fallback_search_url)?;

        let fallback_source = source.clone();
        let search_step = ensure_state(
            flight_searcher(models.search.clone(), source, max_results)?,
            FLIGHT_OPTIONS_KEY,
            move |ctx| fallback_flight_options(ctx, fallback_source.clone()),
        )?;

        let workflow = SequentialAgent::new(
            "flight_pipeline",
            vec![
                Arc::new(query_parser(models.parser)?) as Arc<dyn Agent>,
                Arc::new(url_step),
                Arc::new(search_step),
                Arc::new(summarizer(models.summary)?),
            ],
        )
        .with_description("Parse a flight query, search Kayak and summarize the options");

        let runner = Runner::new(RunnerConfig::new(APP_NAME, Arc::new(workflow)))?;
        Ok(Self { runner })
    }

    /// Builds the configured models and a headless-browser Kayak scraper.
    pub fn from_config(config: &FlightConfig) -> Result<Self> {
        let source = Arc::new(KayakBrowserSource::from_config(config));
        Self::new(FlightModels::from_config(config)?, source, config.max_results)
    }

    pub async fn search(&self, query: &str) -> Result<FlightReport> {
        self.search_with_progress(query, |_| {}).await
    }

    /// Like [`search`](Self::search), calling `on_stage` with the agent name
    /// each time a new step starts producing events.
    pub async fn search_with_progress(
        &self,
        query: &str,
        on_stage: impl FnMut(&str) + Send,
    ) -> Result<FlightReport> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FlightError::Parse("empty query".to_string()));
        }
        self.run_search(query, on_stage)
            .instrument(concierge_telemetry::pipeline_stage_span("flight.search"))
            .await
    }

    async fn run_search(
        &self,
        query: &str,
        on_stage: impl FnMut(&str) + Send,
    ) -> Result<FlightReport> {
        // one throwaway session per search keeps searches independent
        let sessions = self.runner.session_service();
        let session = sessions.create(
            USER_ID,
            None,
            HashMap::from([(QUERY_KEY.to_string(), Value::String(query.to_string()))]),
        )?;
        let session_id = session.id().to_string();

        let outcome = self.drive(&session_id, query, on_stage).await;
        let state = self.runner.session_state(&session_id).unwrap_or_default();
        sessions.delete(&session_id);
        outcome?;

        report_from_state(&state)
    }

    async fn drive(
        &self,
        session_id: &str,
        query: &str,
        mut on_stage: impl FnMut(&str) + Send,
    ) -> Result<()> {
        let mut events = self
            .runner
            .run(USER_ID.to_string(), session_id.to_string(), Content::new("user").with_text(query))
            .await?;

        let mut stage = String::new();
        while let Some(event) = events.next().await {
            let event = event?;
            if event.author != stage {
                stage = event.author.clone();
                concierge_telemetry::info!(stage = %stage, "Flight pipeline stage");
                on_stage(&stage);
            }
        }
        Ok(())
    }
}

fn read_state(ctx: &dyn InvocationContext, key: &str) -> Option<Value> {
    ctx.session().state().get(key)
}

async fn fallback_search_url(ctx: Arc<dyn InvocationContext>) -> concierge_core::Result<Value> {
    let value = read_state(ctx.as_ref(), PARSED_QUERY_KEY).ok_or_else(|| {
        FlightError::Parse("the model returned no origin, destination and date".to_string())
    })?;
    let parsed: ParsedQuery = decode_state_value(&value)?;
    Ok(Value::String(kayak_search_url(&parsed.origin, &parsed.destination, &parsed.date)))
}

async fn fallback_flight_options(
    ctx: Arc<dyn InvocationContext>,
    source: Arc<dyn FlightSource>,
) -> concierge_core::Result<Value> {
    let url = read_state(ctx.as_ref(), SEARCH_URL_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or(FlightError::MissingOutput("search URL"))?;
    let options = source.search(&url).await?;
    Ok(serde_json::to_value(options)?)
}

fn report_from_state(state: &HashMap<String, Value>) -> Result<FlightReport> {
    let parsed: ParsedQuery = decode_state_value(
        state.get(PARSED_QUERY_KEY).ok_or(FlightError::MissingOutput("parsed query"))?,
    )?;
    let search_url = state
        .get(SEARCH_URL_KEY)
        .and_then(Value::as_str)
        .ok_or(FlightError::MissingOutput("search URL"))?
        .to_string();
    let options: Vec<FlightOption> = serde_json::from_value(
        state.get(FLIGHT_OPTIONS_KEY).cloned().ok_or(FlightError::MissingOutput("flight options"))?,
    )
    .map_err(|e| FlightError::Scrape(e.to_string()))?;
    let summary = state
        .get(SUMMARY_KEY)
        .and_then(Value::as_str)
        .map(strip_reasoning)
        .filter(|s| !s.is_empty())
        .ok_or(FlightError::MissingOutput("summary"))?;

    Ok(FlightReport { parsed, search_url, options, summary })
}
