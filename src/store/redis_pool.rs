//! Redis store backend
//!
//! Connections come from a `deadpool-redis` pool. Queued commands are sent
//! as one atomic pipeline (`MULTI` ... `EXEC`), so nothing reaches Redis
//! until `exec` and a transaction is applied whole or not at all.

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_redis::redis::{self, RedisError};
use deadpool_redis::{Config, Connection, CreatePoolError, Pool, PoolConfig, PoolError, Runtime};

use super::{Command, StoreConnection, StoreError, StorePool, StoreResult};

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
        {
            StoreError::Connection(e.to_string())
        } else if e.kind() == redis::ErrorKind::ExecAbortError {
            StoreError::Transaction(e.to_string())
        } else {
            StoreError::Protocol(e.to_string())
        }
    }
}

impl From<PoolError> for StoreError {
    fn from(e: PoolError) -> Self {
        StoreError::Pool(e.to_string())
    }
}

impl From<CreatePoolError> for StoreError {
    fn from(e: CreatePoolError) -> Self {
        StoreError::Pool(e.to_string())
    }
}

/// [`StorePool`] backed by Redis
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl RedisPool {
    /// Build a pool for `url` holding at most `max_size` connections.
    ///
    /// No connection is opened until the first checkout.
    pub fn new(url: &str, max_size: usize) -> StoreResult<Self> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(max_size));
        let pool = config.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl StorePool for RedisPool {
    async fn get(&self) -> StoreResult<Box<dyn StoreConnection>> {
        let conn = self.pool.get().await?;
        Ok(Box::new(RedisConnection {
            conn,
            queued: Vec::new(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if reply != "PONG" {
            return Err(StoreError::Protocol(format!("unexpected PING reply: {}", reply)));
        }
        Ok(())
    }
}

struct RedisConnection {
    conn: Connection,
    queued: Vec<Command>,
}

#[async_trait]
impl StoreConnection for RedisConnection {
    fn send(&mut self, command: Command) -> StoreResult<()> {
        self.queued.push(command);
        Ok(())
    }

    async fn exec(&mut self) -> StoreResult<()> {
        let queued = std::mem::take(&mut self.queued);
        if queued.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &queued {
            match command {
                Command::HSet { key, fields } => {
                    pipe.cmd("HSET").arg(key).arg(fields).ignore();
                }
                Command::Expire { key, ttl } => {
                    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
                    pipe.cmd("PEXPIRE").arg(key).arg(millis).ignore();
                }
            }
        }

        let () = pipe.query_async(&mut self.conn).await?;
        Ok(())
    }

    async fn hgetall(&mut self, key: &str) -> StoreResult<HashMap<String, String>> {
        let fields: HashMap<String, String> =
            redis::cmd("HGETALL").arg(key).query_async(&mut self.conn).await?;
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_creation_is_lazy() {
        // Nothing listens here; building the pool must not connect.
        let pool = RedisPool::new("redis://127.0.0.1:1", 4);
        assert!(pool.is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisPool::new("not a url", 4).is_err());
    }

    #[test]
    fn test_redis_error_mapping() {
        let err: StoreError =
            RedisError::from((redis::ErrorKind::ExecAbortError, "aborted")).into();
        assert!(matches!(err, StoreError::Transaction(_)));

        let err: StoreError = RedisError::from((redis::ErrorKind::TypeError, "bad type")).into();
        assert!(matches!(err, StoreError::Protocol(_)));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: StoreError = RedisError::from(io).into();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
