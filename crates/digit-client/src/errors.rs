//! Client error types.

use digit_auth::AuthError;
use digit_core::BusyError;
use digit_realtime::RealtimeError;

/// Errors surfaced by the client facade and its REST operations.
///
/// The variants separate the three things a caller can act on: fix the
/// input ([`ApiError::InvalidInput`]), fix the credentials
/// ([`ApiError::Auth`]), or retry later ([`ApiError::Busy`] once the retry
/// budget is spent).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An argument was rejected before any I/O happened.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong.
        message: String,
    },

    /// Credential handling failed (bad username/password, lost cookie).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The server is mid-synchronization and temporarily rejects requests.
    #[error("server busy: {message}")]
    Busy {
        /// Server-provided detail, possibly empty.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body text, possibly empty.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body did not have the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The realtime channel failed.
    #[error(transparent)]
    Realtime(#[from] RealtimeError),
}

impl ApiError {
    /// Convenience constructor for input validation failures.
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl BusyError for ApiError {
    fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_the_only_busy_classification() {
        assert!(
            ApiError::Busy {
                message: "sync".into()
            }
            .is_busy()
        );
        assert!(
            !ApiError::Api {
                status: 500,
                message: String::new()
            }
            .is_busy()
        );
        assert!(!ApiError::invalid_input("x").is_busy());
        assert!(!ApiError::from(AuthError::InvalidCredentials).is_busy());
    }

    #[test]
    fn api_error_display() {
        let err = ApiError::Api {
            status: 404,
            message: "missing".into(),
        };
        assert_eq!(err.to_string(), "API error (404): missing");
    }

    #[test]
    fn auth_error_is_transparent() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "username or password rejected");
    }

    #[test]
    fn invalid_input_display() {
        let err = ApiError::invalid_input("limit must be positive");
        assert_eq!(err.to_string(), "invalid input: limit must be positive");
    }
}
