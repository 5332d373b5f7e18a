//! CLI module for the matchmaker
//!
//! Provides command-line interface for:
//! - serve: Wait for the store and serve the session API
//! - ping: One-shot store liveness probe

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, ServeArgs};
pub use commands::{ping, run, run_command, serve, Config, StoreBackend};
pub use errors::{CliError, CliErrorCode, CliResult};
