//! Candidate Buffer & Dispatch
//!
//! Lokale Candidates, die vor der Remote Description entdeckt werden, landen
//! in der Pending Queue. Sobald die Remote Description gesetzt ist, wird die
//! Queue in Entdeckungsreihenfolge geleert und jeder weitere Candidate sofort
//! veröffentlicht.
//!
//! Queue, Zustand und Flush teilen sich einen einzigen Lock. Der Lock wird
//! auch während des Publish gehalten, damit kein neuer Candidate einen
//! gepufferten überholt.

use crate::signaling::{encode_candidate, SignalingError, SignalingTransport, Topic};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Zustand des Buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Remote Description noch unbekannt, Candidates werden gepuffert
    AwaitingRemote,
    /// Remote Description gesetzt, Candidates gehen sofort raus
    RemoteKnown,
}

/// Was mit einem entdeckten Candidate passiert ist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Gathering-Ende oder leerer Candidate
    Ignored,
    Queued,
    Published,
}

struct BufferInner {
    state: BufferState,
    pending: VecDeque<String>,
}

/// Puffer für lokal entdeckte Candidates eines Endpoints
pub struct CandidateBuffer {
    inner: Mutex<BufferInner>,
    transport: Arc<dyn SignalingTransport>,
    topic: Topic,
}

impl CandidateBuffer {
    /// `topic` ist das Candidate-Topic, das der Peer liest
    pub fn new(transport: Arc<dyn SignalingTransport>, topic: Topic) -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                state: BufferState::AwaitingRemote,
                pending: VecDeque::new(),
            }),
            transport,
            topic,
        }
    }

    pub async fn state(&self) -> BufferState {
        self.inner.lock().await.state
    }

    pub async fn pending(&self) -> Vec<String> {
        self.inner.lock().await.pending.iter().cloned().collect()
    }

    /// Verarbeitet einen von der Engine entdeckten Candidate
    pub async fn on_local_candidate(
        &self,
        candidate: Option<String>,
    ) -> Result<Dispatch, SignalingError> {
        let candidate = match candidate {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Ok(Dispatch::Ignored),
        };

        let mut inner = self.inner.lock().await;
        match inner.state {
            BufferState::AwaitingRemote => {
                tracing::debug!("Buffering local candidate until remote description is known");
                inner.pending.push_back(candidate);
                Ok(Dispatch::Queued)
            }
            BufferState::RemoteKnown => {
                self.transport
                    .publish(&self.topic, encode_candidate(&candidate))
                    .await?;
                tracing::debug!("Sent local candidate to {}", self.topic);
                Ok(Dispatch::Published)
            }
        }
    }

    /// Übergang `AwaitingRemote -> RemoteKnown`, veröffentlicht alle gepufferten Candidates
    ///
    /// Gibt die Anzahl veröffentlichter Candidates zurück. Ein zweiter Aufruf
    /// ist wirkungslos.
    pub async fn mark_remote_known(&self) -> Result<usize, SignalingError> {
        let mut inner = self.inner.lock().await;
        if inner.state == BufferState::RemoteKnown {
            return Ok(0);
        }

        let mut flushed = 0;
        while let Some(candidate) = inner.pending.front() {
            self.transport
                .publish(&self.topic, encode_candidate(candidate))
                .await?;
            inner.pending.pop_front();
            flushed += 1;
        }

        inner.state = BufferState::RemoteKnown;
        tracing::info!("Remote description known, flushed {} pending candidates", flushed);
        Ok(flushed)
    }
}

impl std::fmt::Debug for CandidateBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateBuffer")
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayState;
    use crate::signaling::{LocalRelay, Role};

    fn buffer() -> (Arc<CandidateBuffer>, RelayState) {
        let state = RelayState::new();
        let transport: Arc<dyn SignalingTransport> = Arc::new(LocalRelay::new(state.clone()));
        let buffer = CandidateBuffer::new(transport, Role::Initiator.outbound_candidates());
        (Arc::new(buffer), state)
    }

    fn drain(state: &RelayState, topic: &str) -> Vec<String> {
        std::iter::from_fn(|| state.consume(topic))
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_candidates_wait_for_remote_description() {
        let (buffer, state) = buffer();

        assert_eq!(
            buffer.on_local_candidate(Some("c1".into())).await.unwrap(),
            Dispatch::Queued
        );
        assert_eq!(
            buffer.on_local_candidate(Some("c2".into())).await.unwrap(),
            Dispatch::Queued
        );
        assert_eq!(state.depth("candidate/offer"), 0);
        assert_eq!(buffer.pending().await, vec!["c1", "c2"]);

        assert_eq!(buffer.mark_remote_known().await.unwrap(), 2);
        assert_eq!(buffer.state().await, BufferState::RemoteKnown);
        assert!(buffer.pending().await.is_empty());
        assert_eq!(drain(&state, "candidate/offer"), vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_candidates_after_remote_are_published_immediately() {
        let (buffer, state) = buffer();
        buffer.mark_remote_known().await.unwrap();

        assert_eq!(
            buffer.on_local_candidate(Some("c3".into())).await.unwrap(),
            Dispatch::Published
        );
        assert!(buffer.pending().await.is_empty());
        assert_eq!(drain(&state, "candidate/offer"), vec!["c3"]);
    }

    #[tokio::test]
    async fn test_gathering_complete_is_ignored() {
        let (buffer, state) = buffer();

        assert_eq!(buffer.on_local_candidate(None).await.unwrap(), Dispatch::Ignored);
        assert_eq!(
            buffer.on_local_candidate(Some(String::new())).await.unwrap(),
            Dispatch::Ignored
        );
        assert!(buffer.pending().await.is_empty());

        buffer.mark_remote_known().await.unwrap();
        assert_eq!(buffer.on_local_candidate(None).await.unwrap(), Dispatch::Ignored);
        assert_eq!(state.depth("candidate/offer"), 0);
    }

    #[tokio::test]
    async fn test_second_transition_does_not_republish() {
        let (buffer, state) = buffer();
        buffer.on_local_candidate(Some("c1".into())).await.unwrap();

        assert_eq!(buffer.mark_remote_known().await.unwrap(), 1);
        assert_eq!(buffer.mark_remote_known().await.unwrap(), 0);
        assert_eq!(drain(&state, "candidate/offer"), vec!["c1"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_discovery_keeps_every_candidate_once() {
        let (buffer, state) = buffer();

        let producers: Vec<_> = (0..50)
            .map(|i| {
                let buffer = Arc::clone(&buffer);
                tokio::spawn(async move {
                    let candidate = format!("c{}", i);
                    let dispatch = buffer.on_local_candidate(Some(candidate.clone())).await.unwrap();
                    (candidate, dispatch)
                })
            })
            .collect();

        let flusher = {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move { buffer.mark_remote_known().await.unwrap() })
        };

        let mut dispatched = Vec::new();
        for producer in producers {
            dispatched.push(producer.await.unwrap());
        }
        let flushed = flusher.await.unwrap();

        let delivered = drain(&state, "candidate/offer");
        let position = |c: &str| delivered.iter().position(|d| d == c).unwrap();

        let queued: Vec<usize> = dispatched
            .iter()
            .filter(|(_, d)| *d == Dispatch::Queued)
            .map(|(c, _)| position(c))
            .collect();
        let published: Vec<usize> = dispatched
            .iter()
            .filter(|(_, d)| *d == Dispatch::Published)
            .map(|(c, _)| position(c))
            .collect();

        // Kein sofort gesendeter Candidate überholt einen gepufferten
        assert_eq!(queued.len(), flushed);
        assert_eq!(queued.len() + published.len(), 50);
        if let (Some(last_queued), Some(first_published)) =
            (queued.iter().max(), published.iter().min())
        {
            assert!(last_queued < first_published);
        }

        let mut sorted = delivered.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 50);
        assert!(buffer.pending().await.is_empty());
    }
}
