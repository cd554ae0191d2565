use clap::{Parser, Subcommand};
use concierge_telemetry::TelemetryConfig;

/// Keeps the consoles readable; `RUST_LOG` still overrides it.
pub const CONSOLE_LOG_FILTER: &str = "warn";

#[derive(Debug, Parser)]
#[command(name = "concierge")]
#[command(about = "HR assistant and flight search consoles", long_about = None)]
pub struct Cli {
    /// Log as JSON lines instead of text
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to this OTLP collector, e.g. http://localhost:4317
    #[arg(long, global = true)]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn telemetry_config(&self) -> TelemetryConfig {
        let service = match self.command {
            Commands::Hr { .. } => "concierge-hr",
            Commands::Flights { .. } => "concierge-flights",
        };
        let config = TelemetryConfig::new(service)
            .with_json(self.log_json)
            .with_default_filter(CONSOLE_LOG_FILTER);
        match &self.otlp_endpoint {
            Some(endpoint) => config.with_otlp_endpoint(endpoint),
            None => config,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ask HR questions answered from the employee database
    Hr {
        /// Answer one question and exit
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Search Kayak for flights described in plain language
    Flights {
        /// Run one search and exit
        #[arg(short, long)]
        query: Option<String>,
    },
}
