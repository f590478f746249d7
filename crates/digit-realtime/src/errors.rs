//! Realtime error types.

use digit_auth::AuthError;

/// Errors surfaced by the socket manager to its callers.
///
/// Protocol-level problems (malformed frames, unknown subscription ids) are
/// absorbed internally — they are logged and dropped, never returned.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Establishing the socket failed before it reported open.
    #[error("socket connect failed: {message}")]
    Connect {
        /// Underlying failure description.
        message: String,
    },

    /// The socket did not report open within the configured wait ceiling.
    #[error("socket connect timed out")]
    Timeout,

    /// Obtaining a session cookie for the handshake failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The socket manager has been shut down.
    #[error("socket manager is shut down")]
    Closed,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
