//! The subscription registry and the receiver table.
//!
//! One [`Subscription`] per topic, many listeners per subscription. The
//! server addresses event deliveries by an id it assigns at registration
//! time; those ids do not survive a reconnect, so the id→topic receiver
//! table is cleared whenever the connection goes away and rebuilt from the
//! acknowledgements of the next connection.

use std::collections::HashMap;
use std::sync::Arc;

use digit_core::{EventListener, Topic};

/// One-shot callback fired when the server acknowledges a registration.
pub type RegisteredCallback = Box<dyn FnOnce() + Send>;

/// Outcome of applying a registration acknowledgement.
pub enum AckOutcome {
    /// No tracked subscription carries that topic name.
    UnknownTopic,
    /// The id was attached; the taken one-shot callback, if any, is returned
    /// for the caller to invoke.
    Acknowledged(Option<RegisteredCallback>),
}

/// A logical topic subscription: listeners plus registration state.
pub struct Subscription {
    listeners: Vec<Arc<dyn EventListener>>,
    on_registered: Option<RegisteredCallback>,
    server_id: Option<String>,
}

impl Subscription {
    fn new(listener: Arc<dyn EventListener>, on_registered: Option<RegisteredCallback>) -> Self {
        Self {
            listeners: vec![listener],
            on_registered,
            server_id: None,
        }
    }

    /// The server-assigned id, once acknowledged.
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    /// Registered listeners in registration order.
    pub fn listeners(&self) -> &[Arc<dyn EventListener>] {
        &self.listeners
    }
}

/// Registry of active subscriptions keyed by topic, with the server-id
/// receiver table kept alongside.
#[derive(Default)]
pub struct SubscriptionTable {
    by_topic: HashMap<Topic, Subscription>,
    receivers: HashMap<String, Topic>,
}

impl SubscriptionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked topics.
    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    /// Whether any topic is tracked.
    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }

    /// All tracked topics (iteration order unspecified).
    pub fn topics(&self) -> Vec<Topic> {
        self.by_topic.keys().cloned().collect()
    }

    /// Append a listener to an existing subscription for `topic`.
    ///
    /// Returns `false` when the topic is not tracked. Registration state is
    /// untouched: for an existing subscription the registration request was
    /// already sent, so a caller-supplied ack callback should fire
    /// immediately instead of being stored here.
    pub fn append_listener(&mut self, topic: &Topic, listener: &Arc<dyn EventListener>) -> bool {
        let Some(sub) = self.by_topic.get_mut(topic) else {
            return false;
        };
        sub.listeners.push(Arc::clone(listener));
        true
    }

    /// Track a new subscription for `topic`. The topic must not be tracked.
    pub fn insert(
        &mut self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
        on_registered: Option<RegisteredCallback>,
    ) {
        let _ = self
            .by_topic
            .insert(topic, Subscription::new(listener, on_registered));
    }

    /// Stop tracking `topic`, dropping its receiver-table entry.
    pub fn remove(&mut self, topic: &Topic) -> Option<Subscription> {
        let sub = self.by_topic.remove(topic)?;
        if let Some(id) = &sub.server_id {
            let _ = self.receivers.remove(id);
        }
        Some(sub)
    }

    /// Apply a registration acknowledgement: attach the server id to the
    /// named topic and populate the receiver table.
    pub fn acknowledge(&mut self, name: &str, server_id: &str) -> AckOutcome {
        let topic = Topic::raw(name);
        let Some(sub) = self.by_topic.get_mut(&topic) else {
            return AckOutcome::UnknownTopic;
        };
        sub.server_id = Some(server_id.to_string());
        let _ = self.receivers.insert(server_id.to_string(), topic);
        AckOutcome::Acknowledged(sub.on_registered.take())
    }

    /// Listeners for the subscription the server knows as `server_id`,
    /// cloned in registration order. `None` for unknown ids (an expected
    /// race during reconnect windows).
    pub fn listeners_by_server_id(&self, server_id: &str) -> Option<Vec<Arc<dyn EventListener>>> {
        let topic = self.receivers.get(server_id)?;
        self.by_topic
            .get(topic)
            .map(|sub| sub.listeners.clone())
    }

    /// Whether any receiver-table entries exist.
    pub fn has_receivers(&self) -> bool {
        !self.receivers.is_empty()
    }

    /// Invalidate all server ids: the previous connection's ids are
    /// meaningless on the next one. Subscriptions themselves stay tracked.
    pub fn clear_acks(&mut self) {
        self.receivers.clear();
        for sub in self.by_topic.values_mut() {
            sub.server_id = None;
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.by_topic.clear();
        self.receivers.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use digit_core::ObjectEvent;

    use super::*;

    fn noop_listener() -> Arc<dyn EventListener> {
        Arc::new(|_: &ObjectEvent| {})
    }

    #[test]
    fn append_to_missing_topic_returns_false() {
        let mut table = SubscriptionTable::new();
        let listener = noop_listener();
        assert!(!table.append_listener(&Topic::raw("OnDataChanged[x]"), &listener));
    }

    #[test]
    fn insert_then_append_keeps_one_subscription_two_listeners() {
        let mut table = SubscriptionTable::new();
        let topic = Topic::raw("OnDataChanged[x]");
        table.insert(topic.clone(), noop_listener(), None);
        assert!(table.append_listener(&topic, &noop_listener()));
        assert_eq!(table.len(), 1);

        match table.acknowledge("OnDataChanged[x]", "S1") {
            AckOutcome::Acknowledged(_) => {}
            AckOutcome::UnknownTopic => panic!("topic should be tracked"),
        }
        assert_eq!(table.listeners_by_server_id("S1").unwrap().len(), 2);
    }

    #[test]
    fn acknowledge_unknown_topic() {
        let mut table = SubscriptionTable::new();
        match table.acknowledge("OnDataChanged[ghost]", "S1") {
            AckOutcome::UnknownTopic => {}
            AckOutcome::Acknowledged(_) => panic!("nothing to acknowledge"),
        }
    }

    #[test]
    fn acknowledge_takes_callback_once() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired2 = fired.clone();
        let mut table = SubscriptionTable::new();
        table.insert(
            Topic::raw("t"),
            noop_listener(),
            Some(Box::new(move || {
                let _ = fired2.fetch_add(1, Ordering::SeqCst);
            })),
        );

        if let AckOutcome::Acknowledged(Some(cb)) = table.acknowledge("t", "S1") {
            cb();
        } else {
            panic!("expected callback");
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // A re-acknowledgement has no callback left to fire.
        if let AckOutcome::Acknowledged(cb) = table.acknowledge("t", "S2") {
            assert!(cb.is_none());
        } else {
            panic!("topic still tracked");
        }
    }

    #[test]
    fn remove_drops_receiver_entry() {
        let mut table = SubscriptionTable::new();
        let topic = Topic::raw("t");
        table.insert(topic.clone(), noop_listener(), None);
        let _ = table.acknowledge("t", "S1");
        assert!(table.has_receivers());

        let removed = table.remove(&topic).unwrap();
        assert_eq!(removed.server_id(), Some("S1"));
        assert!(table.is_empty());
        assert!(!table.has_receivers());
        assert!(table.listeners_by_server_id("S1").is_none());
    }

    #[test]
    fn clear_acks_keeps_subscriptions_invalidates_ids() {
        let mut table = SubscriptionTable::new();
        table.insert(Topic::raw("a"), noop_listener(), None);
        table.insert(Topic::raw("b"), noop_listener(), None);
        let _ = table.acknowledge("a", "S1");
        let _ = table.acknowledge("b", "S2");

        table.clear_acks();
        assert_eq!(table.len(), 2);
        assert!(!table.has_receivers());
        assert!(table.listeners_by_server_id("S1").is_none());
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut table = SubscriptionTable::new();
        let topic = Topic::raw("t");

        let first: Arc<dyn EventListener> = {
            let order = order.clone();
            Arc::new(move |_: &ObjectEvent| order.lock().unwrap().push(1))
        };
        let second: Arc<dyn EventListener> = {
            let order = order.clone();
            Arc::new(move |_: &ObjectEvent| order.lock().unwrap().push(2))
        };
        table.insert(topic.clone(), first, None);
        let _ = table.append_listener(&topic, &second);
        let _ = table.acknowledge("t", "S1");

        let event = ObjectEvent {
            kind: digit_core::ChangeKind::New,
            object_id: "o".into(),
        };
        for listener in table.listeners_by_server_id("S1").unwrap() {
            listener.on_event(&event);
        }
        assert_eq!(order.lock().unwrap().as_slice(), [1, 2]);
    }
}
