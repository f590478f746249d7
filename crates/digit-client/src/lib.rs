//! # digit-client
//!
//! Async client for the Digit platform.
//!
//! The platform exposes REST endpoints and a multiplexed WebSocket event
//! stream, both gated by a cookie session that expires server-side at will.
//! [`DigitClient`] keeps a long-lived process usable against that surface:
//! cookies are refreshed silently on demand, the transient
//! "synchronization in progress" state is absorbed by bounded retry, and
//! any number of named subscriptions share one socket that reconnects and
//! re-registers on its own.
//!
//! ```no_run
//! use std::sync::Arc;
//! use digit_client::{DigitClient, DigitConfig, ObjectEvent, Topic};
//!
//! # async fn run() -> Result<(), digit_client::ApiError> {
//! let client = DigitClient::new(
//!     DigitConfig::new("https://digit.example.org/app/", "alice", "secret").apply_env(),
//! )?;
//!
//! let forms = client.get_forms().await?;
//! println!("{} forms", forms.len());
//!
//! client
//!     .watch(
//!         Topic::entity_changed("incident"),
//!         Arc::new(|event: &ObjectEvent| println!("{:?} {}", event.kind, event.object_id)),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod auth_flow;
pub mod client;
pub mod config;
pub mod errors;
mod http;
pub mod rest;

pub use auth_flow::RestAuthenticator;
pub use client::DigitClient;
pub use config::DigitConfig;
pub use errors::ApiError;
pub use rest::{FormElementType, NewObject, RestApi, SearchQuery};

pub use digit_auth::{AuthError, ProbeOutcome, ProbePolicy, SessionCookie, SessionManager};
pub use digit_core::{ChangeKind, EventListener, ObjectEvent, RetryPolicy, Topic};
pub use digit_realtime::{ConnectionStatus, RealtimeConfig, RealtimeError, SocketManager};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _config = DigitConfig::default();
        let _query = SearchQuery::new("e", 1);
        let _kind = ChangeKind::from_wire("NEW");
        let _element = FormElementType::Table;
    }
}
