//! # digit-realtime
//!
//! Multiplexed real-time subscriptions over the Digit platform's single
//! WebSocket connection.
//!
//! One [`SocketManager`] per client instance owns the physical socket, the
//! registry of named subscriptions, and the keepalive loop. Consumers
//! subscribe to [`Topic`]s with [`EventListener`]s; the manager connects
//! lazily (drawing a session cookie from a [`CookieSource`]), survives
//! disconnects by reconnecting and re-registering every tracked topic, and
//! routes inbound events to listeners by the server-assigned subscription
//! id.
//!
//! [`Topic`]: digit_core::Topic
//! [`EventListener`]: digit_core::EventListener
//! [`CookieSource`]: digit_auth::CookieSource

#![deny(unsafe_code)]

pub mod errors;
pub mod protocol;
pub mod socket;
pub mod subscription;

pub use errors::RealtimeError;
pub use socket::{ConnectionStatus, RealtimeConfig, SocketManager};
pub use subscription::{RegisteredCallback, Subscription, SubscriptionTable};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _config = RealtimeConfig::default();
        let _table = SubscriptionTable::new();
        let _status = ConnectionStatus::Disconnected;
    }
}
