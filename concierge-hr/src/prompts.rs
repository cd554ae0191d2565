use crate::config::DbDriver;
use crate::db::Record;

pub const SYSTEM_PROMPT: &str = "You are a precise enterprise HR assistant.";

pub fn sql_prompt(question: &str, schema_text: &str, driver: DbDriver) -> String {
    format!(
        r#"
You are an expert {dialect} developer.

Task:
- Generate a fully correct SELECT query for the user question
- Include in SELECT all columns used in WHERE, JOIN, GROUP BY, ORDER BY
- Always use LEFT JOIN for related tables unless filtering requires INNER JOIN
- Use table names exactly as listed in the schema
- Do not invent any column names
- Use LIMIT, ORDER BY, GROUP BY only if required

Database Schema:
{schema_text}

User Question:
{question}

Return ONLY the raw SQL query.
"#,
        dialect = driver.dialect(),
    )
}

pub fn answer_prompt(question: &str, rows: &[Record]) -> String {
    // a slice of JSON maps always serializes
    let data = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"
You are a senior HR assistant.

Question: {question}

Database Result: {data}

Rules:
- Give concise, human-readable answers
- If multiple rows, use numbered list format
- Include experience calculations where relevant
- Do not invent or assume data
"#
    )
}
