//! # digit-core
//!
//! Foundation types shared across the Digit client crates:
//!
//! - [`RetryPolicy`] and [`retry_on_busy`]: bounded fixed-interval retry for
//!   the platform's transient "synchronization in progress" state
//! - [`Topic`]: deterministic names for real-time subscription streams
//! - [`ChangeKind`] / [`ObjectEvent`] / [`EventListener`]: the change
//!   notification vocabulary delivered over the socket
//!
//! No I/O lives here; the crate only needs tokio for the retry sleep.

#![deny(unsafe_code)]

pub mod events;
pub mod retry;
pub mod topic;

pub use events::{ChangeKind, EventListener, ObjectEvent};
pub use retry::{BusyError, RetryPolicy, retry_on_busy};
pub use topic::Topic;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _policy = RetryPolicy::default();
        let _topic = Topic::entity_changed("e1");
        let _kind = ChangeKind::from_wire("NEW");
    }
}
