//! # concierge-flight
//!
//! Flight search as a four-step agent workflow:
//!
//! 1. `query_parser` turns "LA to Boston on 22 January 2026" into a
//!    [`ParsedQuery`]
//! 2. `url_generator` calls [`GenerateKayakUrlTool`] to build the Kayak URL
//! 3. `flight_searcher` calls [`SearchFlightsTool`], which scrapes the top
//!    results through a [`FlightSource`]
//! 4. `summarizer` writes a short comparison
//!
//! Steps hand data to each other through session state (`parsed_query`,
//! `search_url`, `flight_options`, `summary`). When a model skips its tool
//! call, the step computes the value itself so the run can continue.
//!
//! ```rust,no_run
//! use concierge_flight::{FlightConfig, FlightPipeline};
//!
//! # async fn run() -> concierge_flight::Result<()> {
//! let pipeline = FlightPipeline::from_config(&FlightConfig::from_env()?)?;
//! let report = pipeline.search("LA to Boston on 22 January 2026").await?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod json;
pub mod kayak;
pub mod models;
pub mod pipeline;
pub mod search_tool;
pub mod source;

pub use config::FlightConfig;
pub use error::{FlightError, Result};
pub use json::parse_llm_json;
pub use kayak::{GenerateKayakUrlTool, kayak_search_url};
pub use models::{FlightOption, FlightReport, ParsedQuery};
pub use pipeline::{FlightModels, FlightPipeline};
pub use search_tool::SearchFlightsTool;
pub use source::{FlightSource, KayakBrowserSource};
