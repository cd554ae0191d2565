//! # concierge-runner
//!
//! Execution runtime for Concierge agents.
//!
//! - [`Runner`] - runs a root agent turn by turn against a session
//! - [`RunnerConfig`] - configuration for the runner
//! - [`InvocationContext`] - execution context handed to agents
//! - [`InMemorySessionService`] - process-local session store
//!
//! ```rust,no_run
//! use concierge_runner::{Runner, RunnerConfig};
//! # fn build(agent: std::sync::Arc<dyn concierge_core::Agent>) -> concierge_core::Result<()> {
//! let runner = Runner::new(RunnerConfig::new("flight_concierge", agent))?;
//! # let _ = runner;
//! # Ok(())
//! # }
//! ```

mod context;
mod runner;
mod session;

pub use context::InvocationContext;
pub use runner::{Runner, RunnerConfig};
pub use session::{InMemorySession, InMemorySessionService, InMemoryState};
