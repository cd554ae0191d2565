//! # concierge-cli
//!
//! The `concierge` binary: interactive consoles for the HR assistant
//! (`concierge hr`) and flight search (`concierge flights`).
//!
//! Both read their settings from the environment after loading `.env`, and
//! both accept a single request on the command line for scripted use.

pub mod cli;
pub mod console;
pub mod flights;
pub mod hr;

pub use cli::{Cli, Commands};
