//! Telemetry initialization and configuration

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

/// How the process-wide subscriber is assembled.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
    /// OTLP gRPC collector endpoint, e.g. `http://localhost:4317`.
    pub otlp_endpoint: Option<String>,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            json: false,
            otlp_endpoint: None,
            default_filter: "info".to_string(),
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_filter))
            .map_err(Into::into)
    }
}

/// Initialize console logging with the default `info` filter.
///
/// # Example
/// ```
/// use concierge_telemetry::init_telemetry;
/// init_telemetry("hr-assistant").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), TelemetryError> {
    init_with_config(&TelemetryConfig::new(service_name))
}

/// Initialize telemetry exporting spans to an OTLP collector as well as the
/// console.
pub fn init_with_otlp(service_name: &str, endpoint: &str) -> Result<(), TelemetryError> {
    init_with_config(&TelemetryConfig::new(service_name).with_otlp_endpoint(endpoint))
}

/// Install the global subscriber. Only the first call in a process has any
/// effect; later calls return `Ok(())`.
pub fn init_with_config(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let mut outcome = Ok(());
    INIT.call_once(|| outcome = install(config));
    outcome
}

fn install(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = config.env_filter()?;

    // stdout belongs to the interactive consoles
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
    });
    let json_layer =
        config.json.then(|| fmt::layer().json().with_writer(std::io::stderr).with_target(true));

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => {
            let tracer = otlp_tracer(&config.service_name, endpoint)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()?;

    tracing::info!(
        service.name = %config.service_name,
        otlp.endpoint = config.otlp_endpoint.as_deref().unwrap_or("none"),
        "Telemetry initialized"
    );
    Ok(())
}

fn otlp_tracer(
    service_name: &str,
    endpoint: &str,
) -> Result<opentelemetry_sdk::trace::Tracer, TelemetryError> {
    use opentelemetry_otlp::WithExportConfig;

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;
    Ok(tracer)
}

/// Flush pending spans. Call before process exit when OTLP export is on.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TelemetryConfig::new("flights")
            .with_json(true)
            .with_otlp_endpoint("http://localhost:4317")
            .with_default_filter("debug");
        assert_eq!(config.service_name, "flights");
        assert!(config.json);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
        assert_eq!(config.default_filter, "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_telemetry("test-service").unwrap();
        init_telemetry("test-service").unwrap();
    }
}
