use anyhow::Result;
use clap::Parser;
use concierge_cli::{Cli, Commands, flights, hr};

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine; the environment may already be set
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    concierge_telemetry::init_with_config(&cli.telemetry_config()).map_err(|e| anyhow::anyhow!(e))?;

    let outcome = match cli.command {
        Commands::Hr { question } => hr::run(question).await,
        Commands::Flights { query } => flights::run(query).await,
    };
    concierge_telemetry::shutdown_telemetry();
    outcome
}
