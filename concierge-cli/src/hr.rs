use crate::console::run_console;
use anyhow::Result;
use concierge_hr::{HrAnswer, HrAssistant, HrConfig, HrStage};
use std::fmt::Write;

const PREVIEW_ROWS: usize = 3;

const EXAMPLE_QUESTIONS: [&str; 3] = [
    "Who joined in 2022?",
    "Show employees with more than 5 years of experience",
    "List inactive employees",
];

pub fn welcome(model: &str, dialect: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Welcome to the Expert HR Assistant ({} on {})\n", model, dialect);
    let _ = writeln!(
        out,
        "Ask questions about employees, experience, departments, joining dates, exits, or HR insights.\n"
    );
    let _ = writeln!(out, "Examples:");
    for question in EXAMPLE_QUESTIONS {
        let _ = writeln!(out, "- {}", question);
    }
    let _ = writeln!(out, "\nType 'exit' to quit");
    out
}

fn print_stage(stage: HrStage) {
    println!("... {}", stage.label());
}

pub fn render_answer(answer: &HrAnswer) -> String {
    let rule = "-".repeat(40);
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "=".repeat(60));
    let _ = writeln!(out, "SQL Generated:\n{}\n{}", rule, answer.sql);
    let _ = writeln!(out, "\nHR Answer:\n{}\n{}", rule, answer.answer);
    let _ = writeln!(out, "\nRaw Data Preview:\n{}", rule);

    let preview = answer.preview(PREVIEW_ROWS);
    for (i, row) in preview.rows.iter().enumerate() {
        let json = serde_json::to_string(row).unwrap_or_default();
        let _ = writeln!(out, "{}. {}", i + 1, json);
    }
    if preview.remaining > 0 {
        let _ = writeln!(out, "... and {} more rows", preview.remaining);
    }

    let tokens = answer.tokens;
    let _ = writeln!(
        out,
        "\nTokens: SQL {} | Answer {} | Total {}",
        tokens.sql_generation, tokens.answer_generation, tokens.grand_total
    );
    let _ = writeln!(out, "{}", "=".repeat(60));
    out
}

pub async fn run(question: Option<String>) -> Result<()> {
    let config = HrConfig::from_env()?;
    let assistant = HrAssistant::from_config(&config).await?;
    concierge_telemetry::info!(driver = ?assistant.driver(), model = %config.model_name, "HR assistant ready");

    if let Some(question) = question {
        let answer = assistant.ask_with_progress(&question, print_stage).await?;
        println!("{}", render_answer(&answer));
        assistant.database().close().await;
        return Ok(());
    }

    println!("{}", welcome(&config.model_name, assistant.driver().dialect()));
    run_console("Ask HR: ", |question| {
        let assistant = &assistant;
        async move {
            let answer = assistant.ask_with_progress(&question, print_stage).await?;
            Ok::<_, anyhow::Error>(render_answer(&answer))
        }
    })
    .await?;

    assistant.database().close().await;
    Ok(())
}
