use crate::console::run_console;
use anyhow::Result;
use concierge_flight::{FlightConfig, FlightPipeline, FlightReport};
use std::fmt::Write;

pub const QUERY_PROMPT: &str =
    "Please enter your flight query (e.g., 'LA to Boston on 22 January 2026'): ";

fn stage_label(agent: &str) -> &str {
    match agent {
        "query_parser" => "Parsing query",
        "url_generator" => "Generating Kayak URL",
        "flight_searcher" => "Searching Kayak",
        "summarizer" => "Summarizing options",
        other => other,
    }
}

pub fn render_report(report: &FlightReport) -> String {
    let parsed = &report.parsed;
    let mut out = String::new();
    let _ = writeln!(out, "\n{} -> {} on {}", parsed.origin, parsed.destination, parsed.date);
    let _ = writeln!(out, "{}\n", report.search_url);

    if report.options.is_empty() {
        let _ = writeln!(out, "No flight options found.");
    } else {
        let _ = writeln!(out, "{:<3} {:<28} {:>10} {:>12}  {}", "#", "Airline", "Price", "Duration", "Stops");
        for (i, option) in report.options.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<3} {:<28} {:>10} {:>12}  {}",
                i + 1,
                option.airline,
                option.price,
                option.duration,
                option.stops
            );
        }
    }

    let _ = writeln!(out, "\n{}", report.summary);
    out
}

async fn search(pipeline: &FlightPipeline, query: &str) -> Result<String> {
    let report = pipeline
        .search_with_progress(query, |stage| println!("... {}", stage_label(stage)))
        .await?;
    Ok(render_report(&report))
}

pub async fn run(query: Option<String>) -> Result<()> {
    let config = FlightConfig::from_env()?;
    let pipeline = FlightPipeline::from_config(&config)?;

    if let Some(query) = query {
        println!("{}", search(&pipeline, &query).await?);
        return Ok(());
    }

    println!("Flight search (type 'exit' to quit)\n");
    run_console(QUERY_PROMPT, |query| {
        let pipeline = &pipeline;
        async move { search(pipeline, &query).await }
    })
    .await
}
