//! Flight pipeline configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OLLAMA_BASE_URL` | `http://localhost:11434/v1` |
//! | `PARSER_MODEL` | `ollama/deepseek-r1:latest` |
//! | `SEARCH_MODEL` | `ollama/deepseek-r1:7b` |
//! | `SUMMARY_MODEL` | `ollama/deepseek-r1:latest` |
//! | `WEBDRIVER_URL` | `http://localhost:4444` |
//! | `RESULTS_WAIT_MS` | `10000` |
//! | `MAX_RESULTS` | `5` |
//! | `BROWSER_HEADLESS` | `true` |

use crate::error::{FlightError, Result};
use concierge_browser::BrowserConfig;
use concierge_model::{ModelSettings, Provider};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_PARSER_MODEL: &str = "ollama/deepseek-r1:latest";
pub const DEFAULT_SEARCH_MODEL: &str = "ollama/deepseek-r1:7b";
pub const DEFAULT_SUMMARY_MODEL: &str = "ollama/deepseek-r1:latest";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const DEFAULT_RESULTS_WAIT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightConfig {
    pub ollama_base_url: String,
    pub parser_model: String,
    pub search_model: String,
    pub summary_model: String,
    pub webdriver_url: String,
    /// How long the results page is given to render before scraping.
    pub results_wait: Duration,
    pub max_results: usize,
    pub headless: bool,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            parser_model: DEFAULT_PARSER_MODEL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            results_wait: Duration::from_millis(DEFAULT_RESULTS_WAIT_MS),
            max_results: DEFAULT_MAX_RESULTS,
            headless: true,
        }
    }
}

impl FlightConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let max_results: usize = parse_or(&lookup, "MAX_RESULTS", defaults.max_results)?;
        if max_results == 0 {
            return Err(FlightError::config(
                "MAX_RESULTS",
                "must be at least 1",
                "Set MAX_RESULTS to a positive integer such as 5",
            ));
        }

        Ok(Self {
            ollama_base_url: lookup("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            parser_model: lookup("PARSER_MODEL").unwrap_or(defaults.parser_model),
            search_model: lookup("SEARCH_MODEL").unwrap_or(defaults.search_model),
            summary_model: lookup("SUMMARY_MODEL").unwrap_or(defaults.summary_model),
            webdriver_url: lookup("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            results_wait: Duration::from_millis(parse_or(
                &lookup,
                "RESULTS_WAIT_MS",
                DEFAULT_RESULTS_WAIT_MS,
            )?),
            max_results,
            headless: match lookup("BROWSER_HEADLESS") {
                Some(value) => parse_bool("BROWSER_HEADLESS", &value)?,
                None => defaults.headless,
            },
        })
    }

    /// Unprefixed model ids resolve to Ollama.
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings::new(Provider::Ollama).with_ollama_base_url(&self.ollama_base_url)
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig::new().webdriver_url(&self.webdriver_url).headless(self.headless)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            FlightError::config(key, format!("invalid number '{}'", raw), format!("Set {} to a whole number", key))
        }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FlightError::config(
            key,
            format!("invalid boolean '{}'", raw),
            "Use true or false",
        )),
    }
}
