//! Change notification vocabulary.
//!
//! The server tags every delivered event with a change kind and the id of
//! the affected object. Unrecognized tags are preserved as
//! [`ChangeKind::Unknown`] so listeners are still notified — the platform
//! adds kinds over time and losing events is worse than an unspecific one.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Change kinds
// ─────────────────────────────────────────────────────────────────────────────

/// What happened to the object an event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// The object was created.
    New,
    /// The object was updated.
    Updated,
    /// The object was deleted.
    Deleted,
    /// The server sent a tag this client does not know.
    Unknown,
}

impl ChangeKind {
    /// Map a wire tag to a change kind. Unrecognized tags become
    /// [`ChangeKind::Unknown`] rather than an error.
    pub fn from_wire(tag: &str) -> Self {
        match tag {
            "NEW" => Self::New,
            "UPDATED" => Self::Updated,
            "DELETED" => Self::Deleted,
            other => {
                tracing::debug!(tag = %other, "unrecognized change kind");
                Self::Unknown
            }
        }
    }

    /// The wire tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events and listeners
// ─────────────────────────────────────────────────────────────────────────────

/// One delivered change notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEvent {
    /// What happened.
    pub kind: ChangeKind,
    /// Id of the affected object.
    pub object_id: String,
}

/// A registered recipient of change notifications for one topic.
///
/// Listeners are invoked on the socket manager's task in registration
/// order; implementations must not block.
pub trait EventListener: Send + Sync {
    /// Handle one delivered event.
    fn on_event(&self, event: &ObjectEvent);
}

impl<F> EventListener for F
where
    F: Fn(&ObjectEvent) + Send + Sync,
{
    fn on_event(&self, event: &ObjectEvent) {
        self(event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
