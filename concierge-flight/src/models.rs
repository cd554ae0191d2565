use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where and when the traveller wants to fly, as read from their query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedQuery {
    /// Departure city or airport code
    pub origin: String,
    /// Arrival city or airport code
    pub destination: String,
    /// Travel date, e.g. 2026-01-22
    pub date: String,
}

/// One scraped result card. Fields are the page's text, unnormalised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlightOption {
    #[serde(default)]
    pub airline: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub stops: String,
}

impl FlightOption {
    pub(crate) fn from_card(mut card: HashMap<String, String>) -> Self {
        let mut take = |field: &str| card.remove(field).unwrap_or_default();
        Self {
            airline: take("airline"),
            price: take("price"),
            duration: take("duration"),
            stops: take("stops"),
        }
    }
}

/// Everything one flight search produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightReport {
    pub parsed: ParsedQuery,
    pub search_url: String,
    pub options: Vec<FlightOption>,
    pub summary: String,
}
