//! Auth error types.

/// Errors that can occur while obtaining or validating a session cookie.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The server rejected the configured username/password (HTTP 401).
    /// Terminal: retrying cannot help until the credentials change.
    #[error("username or password rejected")]
    InvalidCredentials,

    /// The login response carried no session cookie to extract.
    #[error("login response carried no session cookie")]
    MissingCookie,

    /// A connection-level failure (timeout, reset, abort) before any
    /// server verdict. Transient: the operation may be retried.
    #[error("connection error: {message}")]
    Connection {
        /// Underlying transport error description.
        message: String,
    },

    /// The server answered with a status the client has no mapping for.
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Endpoint that produced it.
        endpoint: String,
    },
}

impl AuthError {
    /// Whether this error is a transient connectivity failure rather than a
    /// server verdict about the credential.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
