//! Demand-driven session management.
//!
//! [`SessionManager`] owns the credential store and turns "give me a cookie
//! the server will accept" into at most one probe and at most one login per
//! call. There is no background refresh timer: validation happens on the
//! call path of whichever operation needs the cookie.
//!
//! Probe failures split three ways:
//! - an explicit invalid verdict replaces the cookie via a fresh login;
//! - transient connection errors retry the probe itself (a network blip
//!   must not cost a re-login);
//! - anything else is logged and treated as invalid, which errs toward one
//!   unnecessary login instead of handing out a dead cookie.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::cookie::{CredentialStore, SessionCookie};
use crate::errors::AuthError;

// ─────────────────────────────────────────────────────────────────────────────
// Seams
// ─────────────────────────────────────────────────────────────────────────────

/// Verdict of a credential probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server accepted the cookie.
    Valid,
    /// The server explicitly rejected the cookie.
    Invalid,
}

/// The remote operations the session manager is built on.
///
/// Implementations perform the actual HTTP calls; the manager only decides
/// when to call them.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Obtain a fresh session cookie.
    ///
    /// Wrong credentials must surface as [`AuthError::InvalidCredentials`];
    /// transport failures as [`AuthError::Connection`].
    async fn login(&self) -> Result<SessionCookie, AuthError>;

    /// Check whether the server still accepts `cookie`.
    ///
    /// An explicit "not authorized" answer is `Ok(ProbeOutcome::Invalid)`,
    /// not an error; errors are reserved for calls that produced no verdict.
    async fn probe(&self, cookie: &SessionCookie) -> Result<ProbeOutcome, AuthError>;
}

/// A source of server-accepted cookies, for components that only consume
/// credentials (e.g. the socket manager at connect time).
#[async_trait]
pub trait CookieSource: Send + Sync {
    /// A cookie the server accepted at call time.
    async fn active_cookie(&self) -> Result<SessionCookie, AuthError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Probe retry policy
// ─────────────────────────────────────────────────────────────────────────────

/// Bounded self-retry for probes that fail at the connection level.
///
/// Orthogonal to the busy-retry wrapper: this targets credential
/// validation, the wrapper targets server maintenance states.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbePolicy {
    /// Total probe attempts per validation (default: 3).
    #[serde(default = "default_probe_attempts")]
    pub attempts: u32,
    /// Wait between probe attempts in ms (default: 1000).
    #[serde(default = "default_probe_delay_ms")]
    pub delay_ms: u64,
}

fn default_probe_attempts() -> u32 {
    3
}
fn default_probe_delay_ms() -> u64 {
    1_000
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 1_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the credential store and the refresh decision.
///
/// All cookie state lives behind one async mutex, so concurrent callers of
/// [`SessionManager::active`] serialize and at most one login is in flight
/// per client instance.
#[derive(Debug)]
pub struct SessionManager<A> {
    authenticator: A,
    store: Mutex<CredentialStore>,
    probe_policy: ProbePolicy,
}

impl<A: Authenticator> SessionManager<A> {
    /// A manager with no cached cookie.
    pub fn new(authenticator: A, probe_policy: ProbePolicy) -> Self {
        Self {
            authenticator,
            store: Mutex::new(CredentialStore::new()),
            probe_policy,
        }
    }

    /// The cached cookie, if any. Never performs I/O.
    pub async fn current(&self) -> Option<SessionCookie> {
        self.store.lock().await.current().cloned()
    }

    /// A cookie guaranteed (at call time) to be accepted by the server.
    ///
    /// No cached cookie: logs in and caches the result. Cached cookie:
    /// probes it, returning it on a valid verdict and replacing it via a
    /// fresh login on an invalid one.
    pub async fn active(&self) -> Result<SessionCookie, AuthError> {
        let mut store = self.store.lock().await;

        let Some(cookie) = store.current().cloned() else {
            return self.login_into(&mut store).await;
        };

        match self.probe_with_retry(&cookie).await {
            Ok(ProbeOutcome::Valid) => Ok(cookie),
            Ok(ProbeOutcome::Invalid) => {
                tracing::info!("session cookie rejected by server, logging in again");
                self.login_into(&mut store).await
            }
            Err(err) if err.is_transient() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "probe failed without verdict, treating cookie as invalid");
                self.login_into(&mut store).await
            }
        }
    }

    /// Unconditionally log in and replace the cached cookie.
    ///
    /// For callers that already saw the server reject the cookie.
    pub async fn refresh(&self) -> Result<SessionCookie, AuthError> {
        let mut store = self.store.lock().await;
        self.login_into(&mut store).await
    }

    async fn login_into(&self, store: &mut CredentialStore) -> Result<SessionCookie, AuthError> {
        let cookie = self.authenticator.login().await?;
        store.replace(cookie.clone());
        tracing::debug!("session cookie obtained");
        Ok(cookie)
    }

    /// Probe `cookie`, retrying transient connection errors up to the
    /// configured attempt count. The last connection error propagates;
    /// verdicts and non-transient errors return immediately.
    async fn probe_with_retry(&self, cookie: &SessionCookie) -> Result<ProbeOutcome, AuthError> {
        let mut attempt: u32 = 1;
        loop {
            match self.authenticator.probe(cookie).await {
                Err(err) if err.is_transient() && attempt < self.probe_policy.attempts => {
                    tracing::debug!(
                        attempt,
                        attempts = self.probe_policy.attempts,
                        error = %err,
                        "probe hit a connection error, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(self.probe_policy.delay_ms)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl<A: Authenticator> CookieSource for SessionManager<A> {
    async fn active_cookie(&self) -> Result<SessionCookie, AuthError> {
        self.active().await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
