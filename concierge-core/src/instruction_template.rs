use crate::{
    ConciergeError, InvocationContext, KEY_PREFIX_APP, KEY_PREFIX_TEMP, KEY_PREFIX_USER, Result,
};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Matches `{+[^{}]*}+` so doubled braces are captured whole and left alone.
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{+[^{}]*\}+").expect("Invalid regex pattern"))
}

/// Letter or underscore first, then letters, digits or underscores.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_valid_state_name(var_name: &str) -> bool {
    match var_name.split_once(':') {
        None => is_identifier(var_name),
        Some((prefix, rest)) => {
            let prefix = format!("{}:", prefix);
            [KEY_PREFIX_APP, KEY_PREFIX_USER, KEY_PREFIX_TEMP].contains(&prefix.as_str())
                && is_identifier(rest)
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn replace_match(ctx: &dyn InvocationContext, match_str: &str) -> Result<String> {
    // Doubled braces are an escape, not a placeholder
    if match_str.starts_with("{{") {
        return Ok(match_str.to_string());
    }

    let var_name = match_str.trim_matches(|c| c == '{' || c == '}').trim();
    let (var_name, optional) = match var_name.strip_suffix('?') {
        Some(name) => (name, true),
        None => (var_name, false),
    };

    if !is_valid_state_name(var_name) {
        return Ok(match_str.to_string());
    }

    match ctx.session().state().get(var_name) {
        Some(value) => Ok(render_value(&value)),
        None if optional => Ok(String::new()),
        None => Err(ConciergeError::Agent(format!("State variable '{}' not found", var_name))),
    }
}

/// Injects session state values into an instruction template.
///
/// - `{var_name}` is required and errors when missing
/// - `{var_name?}` renders as an empty string when missing
/// - `{app:var}`, `{user:var}`, `{temp:var}` read prefixed keys
///
/// String values are inserted verbatim; other JSON values use their compact
/// JSON form. Anything that is not a valid state name stays literal, so JSON
/// examples inside prompts survive.
pub async fn inject_session_state(ctx: &dyn InvocationContext, template: &str) -> Result<String> {
    let regex = placeholder_regex();
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for found in regex.find_iter(template) {
        result.push_str(&template[last_end..found.start()]);
        result.push_str(&replace_match(ctx, found.as_str())?);
        last_end = found.end();
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("search_url"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("123invalid"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("with-dash"));
    }

    #[test]
    fn test_is_valid_state_name() {
        assert!(is_valid_state_name("flight_options"));
        assert!(is_valid_state_name("app:config"));
        assert!(is_valid_state_name("temp:data"));
        assert!(!is_valid_state_name("invalid:prefix"));
        assert!(!is_valid_state_name("too:many:parts"));
        assert!(!is_valid_state_name("\"origin\": \"LA\""));
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&Value::String("LA".into())), "LA");
        assert_eq!(render_value(&serde_json::json!([1, 2])), "[1,2]");
    }
}
