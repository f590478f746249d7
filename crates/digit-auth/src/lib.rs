//! # digit-auth
//!
//! Session cookie lifecycle for the Digit platform.
//!
//! The platform gates everything behind an opaque session cookie obtained by
//! login and invalidated server-side at will. This crate owns the decision
//! logic around that cookie:
//!
//! - [`SessionCookie`] / [`CredentialStore`]: the credential and its
//!   in-memory home (no I/O)
//! - [`SessionManager`]: demand-driven obtain/probe/refresh over an injected
//!   [`Authenticator`]
//! - [`CookieSource`]: the consumer-facing seam for components that only
//!   need "a cookie the server accepts right now"
//!
//! The HTTP implementations of login and probe live in `digit-client`; this
//! crate never touches the network itself.

#![deny(unsafe_code)]

pub mod cookie;
pub mod errors;
pub mod session;

pub use cookie::{CredentialStore, SessionCookie};
pub use errors::AuthError;
pub use session::{Authenticator, CookieSource, ProbeOutcome, ProbePolicy, SessionManager};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _store = CredentialStore::new();
        let _policy = ProbePolicy::default();
        let _cookie = SessionCookie::new("sid=1");
    }
}
