use crate::config::FlightConfig;
use crate::error::{FlightError, Result};
use crate::models::FlightOption;
use async_trait::async_trait;
use concierge_browser::{BrowserConfig, BrowserSession};
use concierge_telemetry::Instrument;
use std::time::Duration;

pub const RESULT_CARD_SELECTOR: &str = ".resultWrapper";

/// Field name and CSS selector for each value read from a result card.
pub const RESULT_FIELDS: &[(&str, &str)] = &[
    ("airline", ".codeshares-airline-names"),
    ("price", ".price-text"),
    ("duration", ".duration-text"),
    ("stops", ".stops-text"),
];

/// Produces flight options for a search URL.
#[async_trait]
pub trait FlightSource: Send + Sync {
    async fn search(&self, url: &str) -> Result<Vec<FlightOption>>;
}

/// Scrapes the Kayak results page in a fresh browser session per search.
pub struct KayakBrowserSource {
    browser: BrowserConfig,
    results_wait: Duration,
    max_results: usize,
}

impl KayakBrowserSource {
    pub fn new(browser: BrowserConfig, results_wait: Duration, max_results: usize) -> Self {
        Self { browser, results_wait, max_results }
    }

    pub fn from_config(config: &FlightConfig) -> Self {
        Self::new(config.browser_config(), config.results_wait, config.max_results)
    }

    async fn scrape(&self, session: &BrowserSession, url: &str) -> Result<Vec<FlightOption>> {
        session.navigate(url).await?;
        // results render client-side after load
        session.wait(self.results_wait).await?;
        let cards =
            session.extract_cards(RESULT_CARD_SELECTOR, RESULT_FIELDS, self.max_results).await?;
        Ok(cards.into_iter().map(FlightOption::from_card).collect())
    }
}

#[async_trait]
impl FlightSource for KayakBrowserSource {
    async fn search(&self, url: &str) -> Result<Vec<FlightOption>> {
        let session = BrowserSession::new(self.browser.clone());
        session.start().await.map_err(|e| FlightError::Scrape(e.to_string()))?;

        let result = self
            .scrape(&session, url)
            .instrument(concierge_telemetry::pipeline_stage_span("flight.scrape"))
            .await;

        if let Err(e) = session.stop().await {
            concierge_telemetry::warn!(error = %e, "Failed to close browser");
        }

        let options = result.map_err(|e| match e {
            FlightError::Pipeline(inner) => FlightError::Scrape(inner.to_string()),
            other => other,
        })?;
        concierge_telemetry::info!(count = options.len(), "Flight options scraped");
        Ok(options)
    }
}
