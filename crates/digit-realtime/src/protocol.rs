//! Wire frames of the platform's socket protocol.
//!
//! Everything on the wire is a small JSON object. Outbound frames carry an
//! `action` discriminant; inbound frames have no discriminant and are told
//! apart by shape, which is why [`InboundFrame`] is an untagged union tried
//! most-specific first.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// A frame the client sends to the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action")]
pub enum OutboundFrame {
    /// Keepalive request; the server answers with a pong frame.
    #[serde(rename = "PING")]
    Ping,
    /// Register interest in the named topics.
    #[serde(rename = "REGISTRATION")]
    Registration {
        /// Topic names to register.
        names: Vec<String>,
    },
    /// Drop interest in the named topics.
    #[serde(rename = "UNREGISTRATION")]
    Unregistration {
        /// Topic names to unregister.
        names: Vec<String>,
    },
}

impl OutboundFrame {
    /// The `action` discriminant, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Registration { .. } => "REGISTRATION",
            Self::Unregistration { .. } => "UNREGISTRATION",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// A frame received from the server.
///
/// Variant order matters: serde tries them top to bottom, and the ack and
/// event shapes are more specific than the pong marker.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    /// Registration acknowledgement carrying the server-assigned id.
    Ack(RegistrationAck),
    /// Event delivery addressed to a server-assigned id.
    Event(EventDelivery),
    /// Keepalive acknowledgement.
    Pong(PongFrame),
}

impl InboundFrame {
    /// Parse one inbound text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// `{created: [name, ..], id}` — the server acknowledges registration of
/// the named topics under one subscription id.
#[derive(Debug, Deserialize)]
pub struct RegistrationAck {
    /// Topic names covered by this acknowledgement.
    pub created: Vec<String>,
    /// The server-assigned subscription id.
    pub id: String,
}

/// `{recipient: {id}, params: [{id, type}, ..]}` — events for the
/// subscription the server knows as `recipient.id`.
#[derive(Debug, Deserialize)]
pub struct EventDelivery {
    /// Which subscription this delivery addresses.
    pub recipient: Recipient,
    /// The affected objects.
    #[serde(default)]
    pub params: Vec<EventParam>,
}

/// Addressing part of an event delivery.
#[derive(Debug, Deserialize)]
pub struct Recipient {
    /// Server-assigned subscription id.
    pub id: String,
}

/// One affected object inside an event delivery.
#[derive(Debug, Deserialize)]
pub struct EventParam {
    /// Id of the affected object.
    pub id: String,
    /// Raw change-kind tag (`NEW`, `UPDATED`, `DELETED`, or anything newer).
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// `{type: "pong"}` — keepalive answer, consumed silently.
#[derive(Debug, Deserialize)]
pub struct PongFrame {
    #[serde(rename = "type")]
    _tag: PongTag,
}

#[derive(Debug, Deserialize)]
enum PongTag {
    #[serde(rename = "pong")]
    Pong,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn ping_serializes() {
        let json = serde_json::to_string(&OutboundFrame::Ping).unwrap();
        assert_eq!(json, r#"{"action":"PING"}"#);
    }

    #[test]
    fn registration_serializes_with_names() {
        let frame = OutboundFrame::Registration {
            names: vec!["OnDataChanged[x]".into()],
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["action"], "REGISTRATION");
        assert_eq!(json["names"][0], "OnDataChanged[x]");
    }

    #[test]
    fn unregistration_serializes_with_names() {
        let frame = OutboundFrame::Unregistration {
            names: vec!["OnNotification[u]".into()],
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["action"], "UNREGISTRATION");
        assert_eq!(json["names"][0], "OnNotification[u]");
    }

    #[test]
    fn pong_parses() {
        let frame = InboundFrame::parse(r#"{"type":"pong"}"#).unwrap();
        assert_matches!(frame, InboundFrame::Pong(_));
    }

    #[test]
    fn ack_parses() {
        let frame = InboundFrame::parse(r#"{"created":["OnDataChanged[x]"],"id":"S1"}"#).unwrap();
        let InboundFrame::Ack(ack) = frame else {
            panic!("expected ack");
        };
        assert_eq!(ack.created, ["OnDataChanged[x]"]);
        assert_eq!(ack.id, "S1");
    }

    #[test]
    fn event_parses() {
        let frame = InboundFrame::parse(
            r#"{"recipient":{"id":"S1"},"params":[{"id":"O1","type":"NEW"},{"id":"O2","type":"DELETED"}]}"#,
        )
        .unwrap();
        let InboundFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert_eq!(event.recipient.id, "S1");
        assert_eq!(event.params.len(), 2);
        assert_eq!(event.params[0].id, "O1");
        assert_eq!(event.params[0].kind, "NEW");
        assert_eq!(event.params[1].kind, "DELETED");
    }

    #[test]
    fn event_without_params_parses_empty() {
        let frame = InboundFrame::parse(r#"{"recipient":{"id":"S1"}}"#).unwrap();
        let InboundFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert!(event.params.is_empty());
    }

    #[test]
    fn event_param_without_kind_defaults_empty() {
        let frame =
            InboundFrame::parse(r#"{"recipient":{"id":"S1"},"params":[{"id":"O1"}]}"#).unwrap();
        let InboundFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert_eq!(event.params[0].kind, "");
    }

    #[test]
    fn malformed_frames_fail_to_parse() {
        assert!(InboundFrame::parse("not json").is_err());
        assert!(InboundFrame::parse(r#"{"type":"surprise"}"#).is_err());
        assert!(InboundFrame::parse(r#"{"unrelated":true}"#).is_err());
        assert!(InboundFrame::parse("[1,2,3]").is_err());
    }

    #[test]
    fn extra_fields_in_event_are_tolerated() {
        let frame = InboundFrame::parse(
            r#"{"recipient":{"id":"S9"},"params":[{"id":"O1","type":"UPDATED"}],"timestamp":123}"#,
        )
        .unwrap();
        assert_matches!(frame, InboundFrame::Event(_));
    }
}
