use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::future::Future;

/// What to do with one line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Ask(String),
    Skip,
    Quit,
}

pub fn classify(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        Input::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Quit
    } else {
        Input::Ask(line.to_string())
    }
}

/// Reads lines until `exit`, `quit`, Ctrl+C or Ctrl+D, printing whatever
/// `handle` renders. A failed request prints `Error: ...` and the loop
/// carries on.
pub async fn run_console<F, Fut>(prompt: &str, mut handle: F) -> Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(prompt) {
            Ok(line) => match classify(&line) {
                Input::Skip => continue,
                Input::Quit => {
                    println!("Goodbye!");
                    break;
                }
                Input::Ask(text) => {
                    rl.add_history_entry(&text)?;
                    match handle(text).await {
                        Ok(rendered) => println!("{}", rendered),
                        Err(e) => eprintln!("\nError: {}\n", e),
                    }
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}
