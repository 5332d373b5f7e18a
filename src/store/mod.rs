//! # Session Store Client
//!
//! Narrow client interface to the key-value backend that holds session
//! records.
//!
//! A caller checks a connection out of a [`StorePool`], queues pipelined
//! commands with [`StoreConnection::send`], and applies them as one
//! transaction with [`StoreConnection::exec`]. The connection goes back to
//! the pool when it is dropped, so every exit path releases it.
//!
//! # Backends
//!
//! - [`RedisPool`] - pooled Redis connections
//! - [`MemoryPool`] - in-process store with expiry and fault injection

mod errors;
mod memory;
mod redis_pool;
mod wait;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

pub use errors::{StoreError, StoreResult};
pub use memory::{FaultInjector, MemoryPool};
pub use redis_pool::RedisPool;
pub use wait::{wait_for_connection, RetryPolicy};

/// A command queued on a connection until the next `exec`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set several fields of the hash stored at `key`
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },

    /// Expire `key` after `ttl`
    Expire { key: String, ttl: Duration },
}

impl Command {
    /// Name of the store command, for logs and error context
    pub fn name(&self) -> &'static str {
        match self {
            Command::HSet { .. } => "HSET",
            Command::Expire { .. } => "EXPIRE",
        }
    }
}

/// A shared pool of store connections
#[async_trait]
pub trait StorePool: Send + Sync {
    /// Check out a connection. It is returned when dropped.
    async fn get(&self) -> StoreResult<Box<dyn StoreConnection>>;

    /// Liveness probe against the backend
    async fn ping(&self) -> StoreResult<()>;
}

/// A single checked-out store connection
#[async_trait]
pub trait StoreConnection: Send {
    /// Queue a command for the next transaction
    fn send(&mut self, command: Command) -> StoreResult<()>;

    /// Apply every queued command atomically and clear the queue
    async fn exec(&mut self) -> StoreResult<()>;

    /// Read every field of the hash at `key`.
    ///
    /// Absent and expired keys yield an empty map.
    async fn hgetall(&mut self, key: &str) -> StoreResult<HashMap<String, String>>;
}
