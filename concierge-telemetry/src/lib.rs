//! # concierge-telemetry
//!
//! Structured logging for Concierge with `tracing`, plus optional
//! OpenTelemetry span export over OTLP.
//!
//! ## Usage
//!
//! ```rust
//! use concierge_telemetry::{init_telemetry, info};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     init_telemetry("hr-assistant")?;
//!     info!("ready");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use spans::*;

pub use init::{
    TelemetryConfig, TelemetryError, init_telemetry, init_with_config, init_with_otlp,
    shutdown_telemetry,
};
