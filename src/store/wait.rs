//! Startup reachability wait
//!
//! The store may come up after this process does, so startup pings it with
//! a doubling backoff until it answers or the attempt bound is reached.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{StorePool, StoreResult};

/// How long to keep probing the store before giving up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of probes (`None` retries forever)
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Delay after the first failed probe, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the delay between probes, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after `attempts` probes
    pub fn bounded(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
            ..Default::default()
        }
    }

    /// Delay before probe number `attempt + 1` (`attempt` is 1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Check the backoff bounds are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be > 0 when set".to_string());
        }
        if self.initial_backoff_ms == 0 {
            return Err("initial_backoff_ms must be > 0".to_string());
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err("max_backoff_ms must be >= initial_backoff_ms".to_string());
        }
        Ok(())
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

/// Block until `pool` answers a liveness probe.
///
/// Returns the last probe error once `policy.max_attempts` probes failed.
pub async fn wait_for_connection(pool: &dyn StorePool, policy: &RetryPolicy) -> StoreResult<()> {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match pool.ping().await {
            Ok(()) => {
                info!(attempt, "store is reachable");
                return Ok(());
            }
            Err(e) if policy.exhausted(attempt) => {
                warn!(attempt, error = %e, "giving up waiting for store");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "store not reachable yet"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
