//! Mailbox-Speicher des Relays
//!
//! Jedes Topic besitzt eine eigene Queue mit eigenem Lock. Die äußere Map
//! wird nur zum Anlegen bzw. Nachschlagen einer Mailbox gesperrt.

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type Mailbox = Arc<Mutex<VecDeque<Bytes>>>;

// ============================================================================
// RELAY STATE
// ============================================================================

/// Zustand des Relays: Topic -> geordnete Payload-Queue
///
/// Wird einmal beim Prozessstart erstellt und per `Clone` (geteilte `Arc`s)
/// in die Request-Handler gereicht.
#[derive(Clone, Default)]
pub struct RelayState {
    mailboxes: Arc<RwLock<HashMap<String, Mailbox>>>,
}

impl RelayState {
    /// Erstellt einen leeren Relay-Zustand
    pub fn new() -> Self {
        Self::default()
    }

    /// Hängt eine Payload an die Mailbox des Topics an
    pub fn publish(&self, topic: &str, payload: Bytes) {
        let mailbox = self.mailbox_or_create(topic);
        let mut queue = mailbox.lock();
        queue.push_back(payload);
        tracing::debug!("Queued payload on '{}' (depth {})", topic, queue.len());
    }

    /// Entnimmt die älteste Payload, `None` wenn die Mailbox leer ist
    pub fn consume(&self, topic: &str) -> Option<Bytes> {
        // Eine nie beschriebene Mailbox ist leer, sie muss nicht angelegt werden
        let mailbox = self.mailboxes.read().get(topic).cloned()?;
        let payload = mailbox.lock().pop_front();
        payload
    }

    /// Anzahl wartender Payloads eines Topics
    pub fn depth(&self, topic: &str) -> usize {
        self.mailboxes
            .read()
            .get(topic)
            .map(|m| m.lock().len())
            .unwrap_or(0)
    }

    /// Alle bisher beschriebenen Topics, sortiert
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.mailboxes.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    fn mailbox_or_create(&self, topic: &str) -> Mailbox {
        if let Some(mailbox) = self.mailboxes.read().get(topic) {
            return Arc::clone(mailbox);
        }

        let mut mailboxes = self.mailboxes.write();
        Arc::clone(mailboxes.entry(topic.to_string()).or_default())
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("topics", &self.topics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_consume_returns_oldest_first() {
        let relay = RelayState::new();
        relay.publish("sdp/offer", Bytes::from_static(b"one"));
        relay.publish("sdp/offer", Bytes::from_static(b"two"));

        assert_eq!(relay.consume("sdp/offer"), Some(Bytes::from_static(b"one")));

        relay.publish("sdp/offer", Bytes::from_static(b"three"));
        assert_eq!(relay.consume("sdp/offer"), Some(Bytes::from_static(b"two")));
        assert_eq!(relay.consume("sdp/offer"), Some(Bytes::from_static(b"three")));
        assert_eq!(relay.consume("sdp/offer"), None);
    }

    #[test]
    fn test_empty_topic_never_resurrects() {
        let relay = RelayState::new();
        assert_eq!(relay.consume("candidate/answer"), None);

        relay.publish("candidate/answer", Bytes::from_static(b"c1"));
        assert!(relay.consume("candidate/answer").is_some());

        for _ in 0..10 {
            assert_eq!(relay.consume("candidate/answer"), None);
        }
        assert_eq!(relay.depth("candidate/answer"), 0);
    }

    #[test]
    fn test_topics_are_independent() {
        let relay = RelayState::new();
        relay.publish("sdp/offer", Bytes::from_static(b"offer"));
        relay.publish("candidate/offer", Bytes::from_static(b"cand"));

        assert_eq!(relay.consume("sdp/answer"), None);
        assert_eq!(relay.depth("sdp/offer"), 1);
        assert_eq!(relay.depth("candidate/offer"), 1);
        assert_eq!(relay.topics(), vec!["candidate/offer", "sdp/offer"]);
    }

    #[test]
    fn test_consume_of_unknown_topic_does_not_create_mailbox() {
        let relay = RelayState::new();
        assert_eq!(relay.consume("sdp/answer"), None);
        assert!(relay.topics().is_empty());
    }

    #[test]
    fn test_concurrent_consumers_receive_each_payload_once() {
        let relay = RelayState::new();
        for i in 0..1000u32 {
            relay.publish("candidate/offer", Bytes::from(i.to_string()));
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let relay = relay.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(payload) = relay.consume("candidate/offer") {
                        seen.push(String::from_utf8(payload.to_vec()).unwrap());
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .map(|s| s.parse().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }
}
