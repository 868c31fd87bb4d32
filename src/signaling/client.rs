//! Relay-Clients
//!
//! `SignalingTransport` ist die Naht zwischen Session-Logik und Relay:
//! - `HttpRelayClient` spricht den Relay über HTTP an
//! - `LocalRelay` greift direkt auf einen `RelayState` im selben Prozess zu

use super::topics::{Topic, TopicFamily};
use crate::relay::RelayState;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum SignalingError {
    #[error("Relay unreachable: {0}")]
    Transport(String),

    #[error("Relay answered {status} for {topic}")]
    UnexpectedStatus { topic: String, status: u16 },

    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),
}

impl SignalingError {
    /// Transport-Fehler werden in Poll-Schleifen lokal wiederholt
    pub fn is_transport(&self) -> bool {
        matches!(self, SignalingError::Transport(_))
    }
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// Publish/Consume gegen einen Mailbox-Relay
#[async_trait]
pub trait SignalingTransport: Send + Sync + 'static {
    /// Hängt eine Payload an das Topic an
    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), SignalingError>;

    /// Entnimmt die älteste Payload, `Ok(None)` wenn die Mailbox leer ist
    async fn consume(&self, topic: &Topic) -> Result<Option<Bytes>, SignalingError>;
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

/// HTTP-Client für einen entfernten Relay
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRelayClient {
    /// Erstellt einen Client für die Basis-URL des Relays
    pub fn new(base_url: &str) -> Result<Self, SignalingError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| SignalingError::InvalidUrl(e.to_string()))?;

        // Ohne abschließenden Slash würde `join` das letzte Segment ersetzen
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    /// Vollständige URL eines Topics
    pub fn topic_url(&self, topic: &Topic) -> Result<Url, SignalingError> {
        self.base_url
            .join(&topic.path())
            .map_err(|e| SignalingError::InvalidUrl(e.to_string()))
    }
}

fn content_type_for(topic: &Topic) -> &'static str {
    match topic.family() {
        TopicFamily::Sdp => "application/json; charset=utf-8",
        TopicFamily::Candidate => "text/plain; charset=utf-8",
    }
}

#[async_trait]
impl SignalingTransport for HttpRelayClient {
    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), SignalingError> {
        let url = self.topic_url(topic)?;
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type_for(topic))
            .body(payload)
            .send()
            .await
            .map_err(|e| SignalingError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SignalingError::UnexpectedStatus {
                topic: topic.path(),
                status: resp.status().as_u16(),
            });
        }

        Ok(())
    }

    async fn consume(&self, topic: &Topic) -> Result<Option<Bytes>, SignalingError> {
        let url = self.topic_url(topic)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SignalingError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                // Der Body wird hier vollständig gelesen und mit `resp` freigegeben
                let body = resp
                    .bytes()
                    .await
                    .map_err(|e| SignalingError::Transport(e.to_string()))?;
                Ok(Some(body))
            }
            status => Err(SignalingError::UnexpectedStatus {
                topic: topic.path(),
                status: status.as_u16(),
            }),
        }
    }
}

// ============================================================================
// IN-PROCESS RELAY
// ============================================================================

/// Direkter Zugriff auf einen Relay im selben Prozess
#[derive(Debug, Clone, Default)]
pub struct LocalRelay {
    state: RelayState,
}

impl LocalRelay {
    pub fn new(state: RelayState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }
}

#[async_trait]
impl SignalingTransport for LocalRelay {
    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), SignalingError> {
        self.state.publish(&topic.path(), payload);
        Ok(())
    }

    async fn consume(&self, topic: &Topic) -> Result<Option<Bytes>, SignalingError> {
        Ok(self.state.consume(&topic.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayServer;
    use crate::signaling::Role;
    use tokio::net::TcpListener;

    async fn spawn_relay() -> (String, RelayState) {
        let state = RelayState::new();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = RelayServer::new(state.clone(), addr.to_string());
        tokio::spawn(server.serve(listener));
        (format!("http://{}", addr), state)
    }

    #[test]
    fn test_topic_url_keeps_base_path() {
        let client = HttpRelayClient::new("http://localhost:8080/relay").unwrap();
        let url = client.topic_url(&Role::Initiator.outbound_sdp()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/relay/sdp/offer");

        let client = HttpRelayClient::new("http://localhost:8080").unwrap();
        let url = client
            .topic_url(&Topic::new(TopicFamily::Candidate, "answer"))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/candidate/answer");
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpRelayClient::new("not a url").unwrap_err();
        assert!(matches!(err, SignalingError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_http_round_trip_through_relay() {
        let (base, state) = spawn_relay().await;
        let client = HttpRelayClient::new(&base).unwrap();
        let topic = Role::Responder.outbound_candidates();

        assert_eq!(client.consume(&topic).await.unwrap(), None);

        client.publish(&topic, Bytes::from_static(b"c1")).await.unwrap();
        client.publish(&topic, Bytes::from_static(b"c2")).await.unwrap();
        assert_eq!(state.depth("candidate/answer"), 2);

        assert_eq!(client.consume(&topic).await.unwrap(), Some(Bytes::from_static(b"c1")));
        assert_eq!(client.consume(&topic).await.unwrap(), Some(Bytes::from_static(b"c2")));
        assert_eq!(client.consume(&topic).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let client = HttpRelayClient::new("http://127.0.0.1:1").unwrap();
        let err = client.consume(&Role::Initiator.inbound_sdp()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_local_relay_shares_state() {
        let state = RelayState::new();
        let relay = LocalRelay::new(state.clone());
        let topic = Role::Initiator.outbound_sdp();

        relay.publish(&topic, Bytes::from_static(b"offer")).await.unwrap();
        assert_eq!(state.depth("sdp/offer"), 1);
        assert_eq!(relay.consume(&topic).await.unwrap(), Some(Bytes::from_static(b"offer")));
        assert_eq!(relay.consume(&topic).await.unwrap(), None);
    }
}
