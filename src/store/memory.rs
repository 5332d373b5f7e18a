//! In-process store backend
//!
//! Hash records with key expiry, kept behind a single lock so a
//! transaction is applied as one unit. Expiry is measured on tokio's clock,
//! which lets tests drive it with a paused runtime.
//!
//! Faults can be switched on and off at runtime through [`FaultInjector`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Command, StoreConnection, StoreError, StorePool, StoreResult};

/// Runtime switches for simulated store failures
#[derive(Debug, Default)]
pub struct FaultInjector {
    fail_checkout: AtomicBool,
    fail_ping: AtomicBool,
    fail_exec: AtomicBool,
    fail_reads: AtomicBool,
    /// 1-based position of the queued command whose send fails; 0 disables
    fail_send_at: AtomicUsize,
}

impl FaultInjector {
    /// Make every checkout fail
    pub fn fail_checkout(&self, fail: bool) {
        self.fail_checkout.store(fail, Ordering::SeqCst);
    }

    /// Make the liveness probe fail
    pub fn fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    /// Make every transaction fail at exec time
    pub fn fail_exec(&self, fail: bool) {
        self.fail_exec.store(fail, Ordering::SeqCst);
    }

    /// Make every hash read fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail the n-th send of each transaction (`None` to disable)
    pub fn fail_send_on(&self, position: Option<usize>) {
        self.fail_send_at
            .store(position.unwrap_or(0), Ordering::SeqCst);
    }

    /// Clear every fault
    pub fn reset(&self) {
        self.fail_checkout(false);
        self.fail_ping(false);
        self.fail_exec(false);
        self.fail_reads(false);
        self.fail_send_on(None);
    }
}

#[derive(Debug, Clone)]
struct Entry {
    fields: HashMap<String, String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
struct Shared {
    entries: Mutex<HashMap<String, Entry>>,
    faults: FaultInjector,
    checked_out: AtomicUsize,
}

impl Shared {
    fn entries(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Connection("store lock poisoned".to_string()))
    }
}

/// In-memory [`StorePool`]
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    shared: Arc<Shared>,
}

impl MemoryPool {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault switches for this store
    pub fn faults(&self) -> &FaultInjector {
        &self.shared.faults
    }

    /// Number of connections currently checked out
    pub fn checked_out(&self) -> usize {
        self.shared.checked_out.load(Ordering::SeqCst)
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.shared
            .entries()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored keys, expired or not
    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.shared.entries().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Time left before `key` expires, if it exists and has an expiry
    pub fn ttl(&self, key: &str) -> Option<std::time::Duration> {
        let now = Instant::now();
        let entries = self.shared.entries().ok()?;
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

#[async_trait]
impl StorePool for MemoryPool {
    async fn get(&self) -> StoreResult<Box<dyn StoreConnection>> {
        if self.shared.faults.fail_checkout.load(Ordering::SeqCst) {
            return Err(StoreError::Pool("injected checkout failure".to_string()));
        }

        self.shared.checked_out.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
            queued: Vec::new(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.shared.faults.fail_ping.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected ping failure".to_string()));
        }
        Ok(())
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
    queued: Vec<Command>,
}

impl MemoryConnection {
    fn apply(entries: &mut HashMap<String, Entry>, command: Command, now: Instant) {
        match command {
            Command::HSet { key, fields } => {
                let entry = entries
                    .entry(key)
                    .and_modify(|e| {
                        if e.is_expired(now) {
                            e.fields.clear();
                            e.expires_at = None;
                        }
                    })
                    .or_insert_with(|| Entry {
                        fields: HashMap::new(),
                        expires_at: None,
                    });
                entry.fields.extend(fields);
            }
            Command::Expire { key, ttl } => {
                if let Some(entry) = entries.get_mut(&key) {
                    if !entry.is_expired(now) {
                        entry.expires_at = Some(now + ttl);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    fn send(&mut self, command: Command) -> StoreResult<()> {
        let fail_at = self.shared.faults.fail_send_at.load(Ordering::SeqCst);
        if fail_at != 0 && fail_at == self.queued.len() + 1 {
            return Err(StoreError::Connection(format!(
                "injected failure sending {}",
                command.name()
            )));
        }

        self.queued.push(command);
        Ok(())
    }

    async fn exec(&mut self) -> StoreResult<()> {
        let queued = std::mem::take(&mut self.queued);

        if self.shared.faults.fail_exec.load(Ordering::SeqCst) {
            return Err(StoreError::Transaction("injected exec failure".to_string()));
        }

        let now = Instant::now();
        let mut entries = self.shared.entries()?;
        // Sweep expired keys that were never read back
        entries.retain(|_, entry| !entry.is_expired(now));
        for command in queued {
            Self::apply(&mut entries, command, now);
        }
        Ok(())
    }

    async fn hgetall(&mut self, key: &str) -> StoreResult<HashMap<String, String>> {
        if self.shared.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("injected read failure".to_string()));
        }

        let now = Instant::now();
        let mut entries = self.shared.entries()?;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(HashMap::new())
            }
            Some(entry) => Ok(entry.fields.clone()),
            None => Ok(HashMap::new()),
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.shared.checked_out.fetch_sub(1, Ordering::SeqCst);
    }
}
