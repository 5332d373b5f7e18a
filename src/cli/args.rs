//! CLI argument definitions using clap
//!
//! Commands:
//! - matchmaker serve [--config <path>] [overrides]
//! - matchmaker ping [--config <path>] [--redis-url <url>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::LogFormat;

use super::commands::StoreBackend;

/// Matchmaker - game session registry
#[derive(Parser, Debug)]
#[command(name = "matchmaker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for the store, then serve the session API
    Serve(ServeArgs),

    /// Probe the store once and exit
    Ping {
        /// Path to configuration file
        #[arg(long, env = "MATCHMAKER_CONFIG")]
        config: Option<PathBuf>,

        /// Redis URL, overrides the config file
        #[arg(long, env = "REDIS_URL")]
        redis_url: Option<String>,
    },
}

/// Flags for `serve`. Each one overrides the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(long, env = "MATCHMAKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "MATCHMAKER_HOST")]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(long, env = "MATCHMAKER_PORT")]
    pub port: Option<u16>,

    /// Redis URL
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Store backend
    #[arg(long, value_enum, env = "MATCHMAKER_STORE")]
    pub store: Option<StoreBackend>,

    /// Startup probes before giving up (retries forever when unset)
    #[arg(long, env = "MATCHMAKER_STARTUP_ATTEMPTS")]
    pub startup_attempts: Option<u32>,

    /// Log output format (text or json)
    #[arg(long, env = "MATCHMAKER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
