//! Session persistence against the store
//!
//! Each operation checks out one connection and holds it only for that
//! operation. The connection is a boxed guard, so it goes back to the pool
//! on every return path.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::store::{Command, StorePool};

use super::errors::{ResultExt, SessionError, SessionResult};
use super::session::{session_key, Session, SESSION_TTL};

/// Reads and writes session records
#[derive(Clone)]
pub struct SessionRepository {
    pool: Arc<dyn StorePool>,
    ttl: Duration,
}

impl SessionRepository {
    /// Repository using the standard session lifetime
    pub fn new(pool: Arc<dyn StorePool>) -> Self {
        Self {
            pool,
            ttl: SESSION_TTL,
        }
    }

    /// Override the session lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Lifetime applied on every write
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `session`, replacing any previous record and resetting its expiry.
    ///
    /// The fields and the expiry are applied in one transaction.
    pub async fn store(&self, session: &Session) -> SessionResult<()> {
        session.validate()?;

        let key = session.key();
        info!(key = %key, "storing session");

        let mut conn = self
            .pool
            .get()
            .await
            .context("Could not get store connection")?;

        conn.send(Command::HSet {
            key: key.clone(),
            fields: session.to_fields(),
        })
        .context("Could not send HSET")?;

        conn.send(Command::Expire {
            key: key.clone(),
            ttl: self.ttl,
        })
        .context("Could not send EXPIRE")?;

        conn.exec()
            .await
            .context("Could not save session to store")?;

        debug!(key = %key, ttl_secs = self.ttl.as_secs(), "session stored");
        Ok(())
    }

    /// Fetch the session stored under `id`.
    ///
    /// Missing and expired sessions are reported as `NotFound`.
    pub async fn fetch(&self, id: &str) -> SessionResult<Session> {
        if id.is_empty() {
            return Err(SessionError::invalid("session id must not be empty"));
        }

        let key = session_key(id);
        info!(key = %key, "getting session");

        let mut conn = self
            .pool
            .get()
            .await
            .context("Could not get store connection")?;

        let fields = conn
            .hgetall(&key)
            .await
            .with_context(|| format!("Error getting hash for key {}", key))?;

        if fields.is_empty() {
            warn!(key = %key, "could not find session");
            return Err(SessionError::not_found());
        }

        Session::from_fields(&fields).context("Error scanning session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionErrorKind;
    use crate::store::MemoryPool;

    fn repository() -> (MemoryPool, SessionRepository) {
        let pool = MemoryPool::new();
        let repo = SessionRepository::new(Arc::new(pool.clone()));
        (pool, repo)
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        let (pool, repo) = repository();
        let session = Session::new("abc123", "10.0.0.5", 7777);

        repo.store(&session).await.unwrap();
        assert_eq!(repo.fetch("abc123").await.unwrap(), session);
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_store_sets_expiry() {
        let (pool, repo) = repository();
        repo.store(&Session::new("a", "", 0)).await.unwrap();

        let ttl = pool.ttl("Session:a").unwrap();
        assert!(ttl <= SESSION_TTL);
        assert!(ttl > SESSION_TTL - Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let (pool, repo) = repository();
        let err = repo.fetch("missing").await.unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::NotFound);
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_empty_id_rejected_before_checkout() {
        let (pool, repo) = repository();
        pool.faults().fail_checkout(true);

        let err = repo.store(&Session::default()).await.unwrap_err();
        assert!(err.is_invalid());

        let err = repo.fetch("").await.unwrap_err();
        assert!(err.is_invalid());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_all_fields() {
        let (_pool, repo) = repository();
        repo.store(&Session::new("a", "10.0.0.1", 1000)).await.unwrap();
        repo.store(&Session::new("a", "", 0)).await.unwrap();

        assert_eq!(repo.fetch("a").await.unwrap(), Session::new("a", "", 0));
    }

    #[tokio::test]
    async fn test_errors_carry_context() {
        let (pool, repo) = repository();
        pool.faults().fail_send_on(Some(1));

        let err = repo.store(&Session::new("a", "", 0)).await.unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("Could not send HSET: "));

        pool.faults().reset();
        pool.faults().fail_reads(true);
        let err = repo.fetch("a").await.unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("Error getting hash for key Session:a: "));
        assert_eq!(pool.checked_out(), 0);
    }
}
