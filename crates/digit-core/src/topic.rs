//! Subscription topic names.
//!
//! A topic is the deterministic string the server uses to identify one
//! real-time event stream. The platform derives them from domain
//! parameters, e.g. `OnDataChanged[<entityId>]` for change notifications
//! on one entity. The string itself is the identity: two `Topic` values
//! with the same name address the same stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of one real-time event stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Change notifications for all objects of one entity.
    pub fn entity_changed(entity_id: &str) -> Self {
        Self(format!("OnDataChanged[{entity_id}]"))
    }

    /// Notifications addressed to one user.
    pub fn notification(user_id: &str) -> Self {
        Self(format!("OnNotification[{user_id}]"))
    }

    /// A topic from its raw server-side name.
    pub fn raw(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The server-side name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
