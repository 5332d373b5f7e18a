//! CLI command implementations
//!
//! `serve` builds the store pool, waits for it to answer and runs the
//! gateway. `ping` probes the store once.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_server::{GameServer, HttpServerConfig, ServerError};
use crate::observability::{init_logging, LogFormat};
use crate::sessions::{SessionRepository, SESSION_TTL};
use crate::store::{MemoryPool, RedisPool, RetryPolicy, StorePool};

use super::args::{Cli, Command, ServeArgs};
use super::errors::{CliError, CliResult};

/// Which store backs the session registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis, via a connection pool
    #[default]
    Redis,
    /// In-process store; sessions are lost on exit
    Memory,
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Listen address
    #[serde(default)]
    pub server: HttpServerConfig,

    /// Store backend (default: redis)
    #[serde(default)]
    pub store: StoreBackend,

    /// Redis URL (default: redis://127.0.0.1:6379)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Max pooled Redis connections (default: 16)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Session lifetime in seconds (default: 3600)
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Startup wait for the store
    #[serde(default)]
    pub startup: RetryPolicy,

    /// Log output format (default: text)
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_pool_size() -> usize {
    16
}
fn default_session_ttl_secs() -> u64 {
    SESSION_TTL.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            store: StoreBackend::default(),
            redis_url: default_redis_url(),
            pool_size: default_pool_size(),
            session_ttl_secs: default_session_ttl_secs(),
            startup: RetryPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if one is given, otherwise start from defaults
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply `serve` flags on top of the file values
    pub fn apply(&mut self, args: &ServeArgs) {
        if let Some(host) = &args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(url) = &args.redis_url {
            self.redis_url = url.clone();
        }
        if let Some(store) = args.store {
            self.store = store;
        }
        if let Some(attempts) = args.startup_attempts {
            self.startup.max_attempts = Some(attempts);
        }
        if let Some(format) = args.log_format {
            self.log_format = format;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.store == StoreBackend::Redis && self.redis_url.trim().is_empty() {
            return Err(CliError::config_error("redis_url must not be empty"));
        }

        if self.pool_size == 0 {
            return Err(CliError::config_error("pool_size must be > 0"));
        }

        if self.session_ttl_secs == 0 {
            return Err(CliError::config_error("session_ttl_secs must be > 0"));
        }

        self.startup
            .validate()
            .map_err(|e| CliError::config_error(format!("Invalid startup policy: {}", e)))?;

        Ok(())
    }

    /// Session lifetime
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Build the configured store pool
    pub fn build_pool(&self) -> CliResult<Arc<dyn StorePool>> {
        match self.store {
            StoreBackend::Redis => {
                let pool = RedisPool::new(&self.redis_url, self.pool_size).map_err(|e| {
                    CliError::startup_failed(format!("Could not create Redis pool: {}", e))
                })?;
                Ok(Arc::new(pool))
            }
            StoreBackend::Memory => Ok(Arc::new(MemoryPool::new())),
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve(args) => serve(&args),
        Command::Ping { config, redis_url } => ping(config.as_deref(), redis_url),
    }
}

/// Serve the session API
///
/// 1. Load config and apply flag overrides
/// 2. Build the store pool and the gateway
/// 3. Wait for the store, then serve until Ctrl-C
pub fn serve(args: &ServeArgs) -> CliResult<()> {
    let mut config = Config::load_or_default(args.config.as_deref())?;
    config.apply(args);
    config.validate()?;

    init_logging(config.log_format);
    tracing::info!(
        store = ?config.store,
        redis_url = %config.redis_url,
        addr = %config.server.socket_addr(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::startup_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let pool = config.build_pool()?;
        let repository =
            SessionRepository::new(Arc::clone(&pool)).with_ttl(config.session_ttl());
        let server = GameServer::with_repository(config.server.clone(), pool, repository)
            .with_retry_policy(config.startup.clone());

        server.start().await.map_err(|e| match e {
            ServerError::StoreUnavailable(_) => CliError::startup_failed(e.to_string()),
            _ => CliError::serve_failed(e.to_string()),
        })
    })
}

/// Probe the store once
pub fn ping(config_path: Option<&Path>, redis_url: Option<String>) -> CliResult<()> {
    let mut config = Config::load_or_default(config_path)?;
    if let Some(url) = redis_url {
        config.redis_url = url;
    }
    config.validate()?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::startup_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let pool = config.build_pool()?;
        pool.ping()
            .await
            .map_err(|e| CliError::startup_failed(format!("Store did not answer: {}", e)))
    })?;

    println!("PONG");
    Ok(())
}
