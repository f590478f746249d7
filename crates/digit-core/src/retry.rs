//! Bounded retry for the platform's transient busy state.
//!
//! The Digit server periodically enters an internal synchronization phase
//! during which it rejects requests with a dedicated status. Those rejections
//! are not failures of the request itself, so any remote operation can be
//! wrapped with [`retry_on_busy`]: wait a fixed interval, try again, give up
//! after a hard attempt ceiling. Every other error propagates immediately.
//!
//! The attempt counter is local to one [`retry_on_busy`] call — two
//! concurrent wrapped operations never share a budget.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Default total attempt ceiling (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default wait between attempts in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 5_000;

/// Retry parameters for busy-state absorption.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total number of attempts before the last busy error becomes terminal
    /// (default: 10). A value of 1 disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed wait between attempts in ms (default: 5000).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// The wait between attempts as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can identify the server's transient busy state.
///
/// Implemented by the error type of any operation handed to
/// [`retry_on_busy`]. Only errors reporting `true` are retried.
pub trait BusyError {
    /// Whether this error is the transient "synchronization in progress"
    /// rejection rather than a real failure.
    fn is_busy(&self) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution
// ─────────────────────────────────────────────────────────────────────────────

/// Run `op`, retrying on busy errors up to `policy.max_attempts` total
/// attempts with a fixed wait in between.
///
/// `op` is invoked once per attempt and must produce a fresh future each
/// time. Non-busy errors propagate immediately without consuming the
/// remaining budget; exhausting the budget returns the last busy error.
pub async fn retry_on_busy<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: BusyError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_busy() && attempt < policy.max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = policy.delay_ms,
                    "server busy, retrying"
                );
                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
