//! Negotiation Sequencer
//!
//! Initiator: Offer erstellen -> lokal setzen -> veröffentlichen -> auf Answer
//! warten -> remote setzen -> Pending Queue leeren.
//!
//! Responder: auf Offer warten -> remote setzen -> Pending Queue leeren ->
//! Answer erstellen -> lokal setzen -> veröffentlichen.

use super::candidates::CandidateBuffer;
use super::engine::{EngineError, PeerEngine};
use crate::signaling::{
    decode_candidate, DescriptionKind, Poller, ProtocolError, Role, SessionDescription,
    SignalingError, SignalingTransport,
};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Fehler, die eine Session beenden
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("Signaling failed: {0}")]
    Transport(#[from] SignalingError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Engine rejected operation: {0}")]
    Engine(#[from] EngineError),

    #[error("Session task failed: {0}")]
    Task(String),
}

/// Ergebnis eines Verhandlungsdurchlaufs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// Lokale und entfernte Description sind gesetzt
    Completed,
    /// Abgebrochen bevor der Peer geantwortet hat
    Cancelled,
}

// ============================================================================
// NEGOTIATOR
// ============================================================================

/// Steuert den Offer/Answer-Austausch einer Rolle
pub struct Negotiator {
    role: Role,
    engine: Arc<dyn PeerEngine>,
    transport: Arc<dyn SignalingTransport>,
    buffer: Arc<CandidateBuffer>,
    poller: Poller,
}

impl Negotiator {
    pub fn new(
        role: Role,
        engine: Arc<dyn PeerEngine>,
        transport: Arc<dyn SignalingTransport>,
        buffer: Arc<CandidateBuffer>,
        poller: Poller,
    ) -> Self {
        Self {
            role,
            engine,
            transport,
            buffer,
            poller,
        }
    }

    /// Führt den Offer/Answer-Austausch der eigenen Rolle einmal durch
    pub async fn negotiate(&self) -> Result<NegotiationOutcome, SessionError> {
        match self.role {
            Role::Initiator => self.negotiate_as_initiator().await,
            Role::Responder => self.negotiate_as_responder().await,
        }
    }

    async fn negotiate_as_initiator(&self) -> Result<NegotiationOutcome, SessionError> {
        let offer = self.engine.create_offer().await?;
        self.engine.set_local_description(offer.clone()).await?;

        let topic = self.role.outbound_sdp();
        self.transport.publish(&topic, offer.to_payload()).await?;
        tracing::info!("Published offer to {}", topic);

        let Some(answer) = self.await_description(DescriptionKind::Answer).await? else {
            return Ok(NegotiationOutcome::Cancelled);
        };

        self.engine.set_remote_description(answer).await?;
        self.buffer.mark_remote_known().await?;

        tracing::info!("Negotiation complete ({})", self.role);
        Ok(NegotiationOutcome::Completed)
    }

    async fn negotiate_as_responder(&self) -> Result<NegotiationOutcome, SessionError> {
        let Some(offer) = self.await_description(DescriptionKind::Offer).await? else {
            return Ok(NegotiationOutcome::Cancelled);
        };

        self.engine.set_remote_description(offer).await?;
        self.buffer.mark_remote_known().await?;

        let answer = self.engine.create_answer().await?;
        self.engine.set_local_description(answer.clone()).await?;

        let topic = self.role.outbound_sdp();
        self.transport.publish(&topic, answer.to_payload()).await?;
        tracing::info!("Published answer to {}", topic);

        tracing::info!("Negotiation complete ({})", self.role);
        Ok(NegotiationOutcome::Completed)
    }

    /// Pollt das eingehende SDP-Topic bis zur ersten Description
    ///
    /// Das Topic wird danach nicht mehr gelesen, weitere Payloads bleiben liegen.
    async fn await_description(
        &self,
        expected: DescriptionKind,
    ) -> Result<Option<SessionDescription>, SessionError> {
        let topic = self.role.inbound_sdp();
        tracing::info!("Waiting for {} on {}", expected, topic);

        let Some(payload) = self.poller.next(self.transport.as_ref(), &topic).await? else {
            return Ok(None);
        };

        let desc = SessionDescription::from_payload(&payload, expected)?;
        tracing::info!("Received {} from {}", expected, topic);
        Ok(Some(desc))
    }

    /// Reicht eingehende Candidates an die Engine weiter, bis abgebrochen wird
    pub async fn run_candidate_loop(&self) -> Result<(), SessionError> {
        let topic = self.role.inbound_candidates();
        let mut received = 0usize;

        while let Some(payload) = self.poller.next(self.transport.as_ref(), &topic).await? {
            let candidate = decode_candidate(&payload)?;
            tracing::debug!("Received remote candidate: {}", candidate);
            self.engine.add_remote_candidate(candidate).await?;
            received += 1;
        }

        tracing::debug!("Candidate loop on {} stopped after {} candidates", topic, received);
        Ok(())
    }
}

impl std::fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("role", &self.role)
            .field("poll_interval", &self.poller.interval())
            .finish()
    }
}
