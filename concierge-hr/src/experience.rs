use crate::db::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Whole years and 30-day months since `joining_date`, or `N/A` when the
/// date is unknown. A joining date in the future counts as no experience.
pub fn calculate_experience(joining_date: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(joined) = joining_date else {
        return "N/A".to_string();
    };
    let days = (today - joined).num_days().max(0);
    format!("{} years {} months", days / 365, (days % 365) / 30)
}

/// Reads a date from a JSON cell: `YYYY-MM-DD`, an RFC 3339 timestamp or a
/// naive `YYYY-MM-DD HH:MM:SS[.f]` timestamp (with `T` or a space).
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|ts| ts.date())
}

/// True for column names that hold an employee's joining date, e.g.
/// `joining_date`, `JoiningDate`, `date_of_joining`, `hire_date`.
pub fn is_joining_date_column(name: &str) -> bool {
    let normalized: String =
        name.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "joiningdate" | "dateofjoining" | "joindate" | "joinedon" | "doj" | "hiredate" | "dateofhire"
    )
}

/// Adds an `experience` field to every row that has a joining-date column
/// and no `experience` of its own.
pub fn annotate_experience(rows: &mut [Record], today: NaiveDate) {
    for row in rows.iter_mut() {
        if row.contains_key("experience") {
            continue;
        }
        let Some(key) = row.keys().find(|k| is_joining_date_column(k)).cloned() else {
            continue;
        };
        let joined = row.get(&key).and_then(parse_date);
        row.insert("experience".to_string(), Value::String(calculate_experience(joined, today)));
    }
}
