use crate::config::{DbDriver, HrConfig};
use crate::db::{Database, Record};
use crate::error::{HrError, Result};
use crate::experience::annotate_experience;
use crate::guard::{sanitize_sql, validate_sql};
use crate::prompts::{SYSTEM_PROMPT, answer_prompt, sql_prompt};
use crate::schema::Schema;
use chrono::{Local, NaiveDate};
use concierge_core::{Content, Llm, LlmRequest};
use concierge_model::{ModelSettings, Provider, model_from_id};
use concierge_telemetry::Instrument;
use serde::Serialize;
use std::sync::Arc;

/// Token counts for one question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub sql_generation: i32,
    pub answer_generation: i32,
    pub grand_total: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrAnswer {
    pub sql: String,
    pub answer: String,
    pub raw_data: Vec<Record>,
    pub tokens: TokenUsage,
}

/// The steps of one question, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrStage {
    LoadingSchema,
    GeneratingSql,
    ExecutingQuery,
    GeneratingAnswer,
}

impl HrStage {
    pub fn label(self) -> &'static str {
        match self {
            HrStage::LoadingSchema => "Loading schema...",
            HrStage::GeneratingSql => "Generating SQL...",
            HrStage::ExecutingQuery => "Executing query...",
            HrStage::GeneratingAnswer => "Generating answer...",
        }
    }
}

/// The first rows of a result, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview<'a> {
    pub rows: &'a [Record],
    pub remaining: usize,
}

impl HrAnswer {
    pub fn preview(&self, n: usize) -> Preview<'_> {
        let shown = n.min(self.raw_data.len());
        Preview { rows: &self.raw_data[..shown], remaining: self.raw_data.len() - shown }
    }
}

/// Answers HR questions: schema → SQL (model) → guard → query → answer (model).
pub struct HrAssistant {
    llm: Arc<dyn Llm>,
    db: Database,
    today: Option<NaiveDate>,
}

impl HrAssistant {
    pub fn new(llm: Arc<dyn Llm>, db: Database) -> Self {
        Self { llm, db, today: None }
    }

    /// Connects to the configured database and Groq model.
    pub async fn from_config(config: &HrConfig) -> Result<Self> {
        let mut settings =
            ModelSettings::new(Provider::Groq).with_groq_api_key(&config.groq_api_key);
        if let Some(base_url) = &config.groq_base_url {
            settings = settings.with_groq_base_url(base_url);
        }
        // MODEL_NAME values like `openai/gpt-oss-20b` are Groq model ids, not provider prefixes
        let llm = model_from_id(&config.model_name, &settings)?;
        let db = Database::connect(&config.database).await?;
        Ok(Self::new(llm, db))
    }

    /// Pins the date used for experience calculations.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn call_model(&self, prompt: String, what: &'static str) -> Result<(String, i32)> {
        let request = LlmRequest::new(
            self.llm.name(),
            vec![
                Content::new("system").with_text(SYSTEM_PROMPT),
                Content::new("user").with_text(prompt),
            ],
        )
        .with_temperature(0.0);

        let completion = concierge_model::complete(self.llm.as_ref(), request).await?;
        let text = completion.text.trim().to_string();
        if text.is_empty() {
            return Err(HrError::EmptyCompletion(what));
        }
        Ok((text, completion.usage.total_token_count))
    }

    pub async fn load_schema(&self) -> Result<Schema> {
        self.db
            .load_schema()
            .instrument(concierge_telemetry::pipeline_stage_span("hr.load_schema"))
            .await
    }

    /// Asks the model for one read-only query. The reply is sanitized and
    /// must pass the SQL guard.
    pub async fn generate_sql(&self, question: &str, schema: &Schema) -> Result<(String, i32)> {
        let prompt = sql_prompt(question, &schema.render(), self.db.driver());
        let (raw, tokens) = self
            .call_model(prompt, "SQL query")
            .instrument(concierge_telemetry::pipeline_stage_span("hr.generate_sql"))
            .await?;

        let sql = sanitize_sql(&raw);
        validate_sql(&sql)?;
        concierge_telemetry::info!(tokens, sql = %sql, "SQL generated");
        Ok((sql, tokens))
    }

    pub async fn generate_answer(&self, question: &str, rows: &[Record]) -> Result<(String, i32)> {
        let (answer, tokens) = self
            .call_model(answer_prompt(question, rows), "answer")
            .instrument(concierge_telemetry::pipeline_stage_span("hr.generate_answer"))
            .await?;
        concierge_telemetry::info!(tokens, "Answer generated");
        Ok((answer, tokens))
    }

    pub async fn ask(&self, question: &str) -> Result<HrAnswer> {
        self.ask_with_progress(question, |_| {}).await
    }

    /// Like [`ask`](Self::ask), calling `on_stage` as each step starts.
    pub async fn ask_with_progress(
        &self,
        question: &str,
        mut on_stage: impl FnMut(HrStage) + Send,
    ) -> Result<HrAnswer> {
        let question = question.trim();
        on_stage(HrStage::LoadingSchema);
        let schema = self.load_schema().await?;
        on_stage(HrStage::GeneratingSql);
        let (sql, sql_tokens) = self.generate_sql(question, &schema).await?;

        on_stage(HrStage::ExecutingQuery);
        let mut rows = self
            .db
            .execute(&sql)
            .instrument(concierge_telemetry::pipeline_stage_span("hr.execute"))
            .await?;
        let raw_data = rows.clone();
        annotate_experience(&mut rows, self.today());

        on_stage(HrStage::GeneratingAnswer);
        let (answer, answer_tokens) = self.generate_answer(question, &rows).await?;

        Ok(HrAnswer {
            sql,
            answer,
            raw_data,
            tokens: TokenUsage {
                sql_generation: sql_tokens,
                answer_generation: answer_tokens,
                grand_total: sql_tokens + answer_tokens,
            },
        })
    }

    pub fn driver(&self) -> DbDriver {
        self.db.driver()
    }
}
