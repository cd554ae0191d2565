//! # concierge-hr
//!
//! Answers natural-language HR questions from a relational database.
//!
//! Each question runs one fixed chain: load the schema, ask the model for a
//! single `SELECT`, check it with the SQL guard, run it, and ask the model to
//! summarise the rows. Rows with a joining-date column gain an `experience`
//! field before the summary.
//!
//! ```rust,no_run
//! use concierge_hr::{HrAssistant, HrConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HrConfig::from_env()?;
//! let assistant = HrAssistant::from_config(&config).await?;
//! let answer = assistant.ask("Who joined in 2022?").await?;
//! println!("{}\n{}", answer.sql, answer.answer);
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod experience;
pub mod guard;
pub mod prompts;
pub mod schema;

pub use assistant::{HrAnswer, HrAssistant, HrStage, Preview, TokenUsage};
pub use config::{DatabaseConfig, DbDriver, HrConfig};
pub use db::{Database, Record};
pub use error::{ConfigError, HrError, Result, SqlGuardError};
pub use experience::calculate_experience;
pub use guard::{sanitize_sql, validate_sql};
pub use schema::Schema;
