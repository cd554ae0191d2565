//! Read-only guard for model-generated SQL.
//!
//! This is a keyword denylist, not a parser: it rejects anything that does
//! not start with `select` and anything mentioning a mutating keyword as a
//! whole word, even inside a string literal.

use crate::error::SqlGuardError;
use regex::Regex;
use std::sync::LazyLock;

pub const FORBIDDEN_SQL_PATTERN: &str =
    r"\b(insert|update|delete|drop|alter|truncate|exec|merge|create)\b";

static FORBIDDEN_SQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FORBIDDEN_SQL_PATTERN).expect("forbidden SQL pattern is valid"));

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```sql|```").expect("code fence pattern is valid"));

/// Strips markdown code fences and backticks from a model reply and trims
/// the result.
pub fn sanitize_sql(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").replace('`', "").trim().to_string()
}

/// Passes `sql` through unchanged when it looks read-only.
pub fn validate_sql(sql: &str) -> Result<&str, SqlGuardError> {
    let lowered = sql.trim().to_lowercase();
    if !lowered.starts_with("select") {
        return Err(SqlGuardError::NotSelect);
    }
    if let Some(found) = FORBIDDEN_SQL.find(&lowered) {
        return Err(SqlGuardError::ForbiddenKeyword(found.as_str().to_string()));
    }
    Ok(sql)
}
