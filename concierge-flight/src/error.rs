use concierge_core::ConciergeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlightError {
    #[error("{field}: {message}. {suggestion}")]
    Config { field: &'static str, message: String, suggestion: String },

    #[error("Could not parse flight query: {0}")]
    Parse(String),

    #[error("Flight scraping failed: {0}")]
    Scrape(String),

    #[error("Pipeline produced no {0}")]
    MissingOutput(&'static str),

    #[error(transparent)]
    Pipeline(#[from] ConciergeError),
}

impl FlightError {
    pub(crate) fn config(
        field: &'static str,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Config { field, message: message.into(), suggestion: suggestion.into() }
    }
}

// Tools and agents report through the core error type.
impl From<FlightError> for ConciergeError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::Pipeline(inner) => inner,
            FlightError::Config { .. } => ConciergeError::Config(err.to_string()),
            FlightError::Scrape(_) => ConciergeError::Tool(err.to_string()),
            other => ConciergeError::Agent(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_a_suggestion() {
        let err = FlightError::config("MAX_RESULTS", "must be a positive integer", "Set MAX_RESULTS=5");
        assert_eq!(err.to_string(), "MAX_RESULTS: must be a positive integer. Set MAX_RESULTS=5");
    }

    #[test]
    fn converts_into_core_errors() {
        let core: ConciergeError = FlightError::Scrape("no results".into()).into();
        assert_eq!(core.to_string(), "Tool error: Flight scraping failed: no results");

        let core: ConciergeError = FlightError::Parse("empty".into()).into();
        assert_eq!(core.to_string(), "Agent error: Could not parse flight query: empty");

        let original = ConciergeError::Session("gone".into());
        let round: ConciergeError = FlightError::from(original).into();
        assert!(matches!(round, ConciergeError::Session(_)));
    }
}
