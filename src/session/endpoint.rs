//! Endpoint - verdrahtet Engine, Candidate Buffer und Negotiator
//!
//! Pro Session laufen drei Tasks:
//! - Event-Pumpe (Engine-Events -> Candidate Buffer / Logging)
//! - Poll-Schleife für eingehende Candidates
//! - Offer/Answer-Durchlauf der eigenen Rolle
//!
//! Ein fataler Fehler in einem Task beendet die ganze Session.

use super::candidates::CandidateBuffer;
use super::engine::{EngineEvent, PeerEngine};
use super::negotiator::{NegotiationOutcome, Negotiator, SessionError};
use super::rtc_engine::WebRtcEngine;
use crate::config::Config;
use crate::signaling::{Poller, Role, SignalingTransport};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Ein Endpoint einer Zwei-Parteien-Session
pub struct Endpoint {
    role: Role,
    config: Config,
    transport: Arc<dyn SignalingTransport>,
}

impl Endpoint {
    pub fn new(role: Role, config: Config, transport: Arc<dyn SignalingTransport>) -> Self {
        Self {
            role,
            config,
            transport,
        }
    }

    /// Startet die Session mit einer WebRTC Engine
    pub async fn run(self, cancel: CancellationToken) -> Result<(), SessionError> {
        let (event_tx, event_rx) = mpsc::channel(100);
        let engine = WebRtcEngine::new(&self.config, event_tx).await?;
        self.run_with_engine(Arc::new(engine), event_rx, cancel)
            .await
    }

    /// Startet die Session mit einer beliebigen Engine
    ///
    /// Läuft bis `cancel` ausgelöst wird oder ein Task fatal fehlschlägt.
    pub async fn run_with_engine(
        self,
        engine: Arc<dyn PeerEngine>,
        events: mpsc::Receiver<EngineEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SessionError> {
        tracing::info!("Starting {} session via {}", self.role, self.config.relay_url);

        let session_cancel = cancel.child_token();
        let buffer = Arc::new(CandidateBuffer::new(
            Arc::clone(&self.transport),
            self.role.outbound_candidates(),
        ));
        let negotiator = Arc::new(Negotiator::new(
            self.role,
            Arc::clone(&engine),
            Arc::clone(&self.transport),
            Arc::clone(&buffer),
            Poller::new(self.config.poll_interval(), session_cancel.clone()),
        ));

        // Der Data Channel muss vor dem Offer existieren
        if self.role == Role::Initiator {
            engine
                .open_data_channel(&self.config.data_channel_label)
                .await?;
        }

        let mut tasks: JoinSet<Result<(), SessionError>> = JoinSet::new();

        tasks.spawn(pump_events(
            events,
            Arc::clone(&engine),
            buffer,
            self.config.clone(),
            session_cancel.clone(),
        ));

        let candidate_loop = Arc::clone(&negotiator);
        tasks.spawn(async move { candidate_loop.run_candidate_loop().await });

        tasks.spawn(async move {
            if negotiator.negotiate().await? == NegotiationOutcome::Cancelled {
                tracing::info!("Negotiation cancelled before completion");
            }
            Ok(())
        });

        let result = supervise(&mut tasks, &session_cancel).await;

        session_cancel.cancel();
        tasks.shutdown().await;
        engine.close().await;

        if let Err(ref e) = result {
            tracing::error!("{} session aborted: {}", self.role, e);
        } else {
            tracing::info!("{} session closed", self.role);
        }
        result
    }
}

/// Wartet auf Abbruch oder den ersten fatalen Task-Fehler
async fn supervise(
    tasks: &mut JoinSet<Result<(), SessionError>>,
    cancel: &CancellationToken,
) -> Result<(), SessionError> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            joined = tasks.join_next() => match joined {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(e))) => return Err(e),
                Some(Err(e)) => return Err(SessionError::Task(e.to_string())),
                None => {
                    // Session bleibt offen bis zum Abbruch
                    cancel.cancelled().await;
                    return Ok(());
                }
            },
        }
    }
}

/// Verarbeitet Engine-Events in Eingangsreihenfolge
async fn pump_events(
    mut events: mpsc::Receiver<EngineEvent>,
    engine: Arc<dyn PeerEngine>,
    buffer: Arc<CandidateBuffer>,
    config: Config,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::LocalCandidate(candidate) => {
                buffer.on_local_candidate(candidate).await?;
            }
            EngineEvent::ConnectionStateChanged(state) => {
                tracing::info!("ICE Connection State has changed: {}", state);
            }
            EngineEvent::ChannelOpened { label } => {
                tracing::info!(
                    "Data channel '{}' open, sending '{}' every {:?}",
                    label,
                    config.ping_message,
                    config.ping_interval()
                );
                tokio::spawn(send_periodically(
                    Arc::clone(&engine),
                    label,
                    config.clone(),
                    cancel.clone(),
                ));
            }
            EngineEvent::MessageReceived { label, text } => {
                tracing::info!("Message from DataChannel '{}': '{}'", label, text);
            }
        }
    }
    Ok(())
}

/// Sendet den konfigurierten Text periodisch über einen Data Channel
async fn send_periodically(
    engine: Arc<dyn PeerEngine>,
    label: String,
    config: Config,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.ping_interval());
    // Der erste Tick kommt sofort
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                tracing::info!("Sending '{}'", config.ping_message);
                if let Err(e) = engine.send_text(&label, config.ping_message.clone()).await {
                    tracing::warn!("Failed to send on '{}': {}", label, e);
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("role", &self.role)
            .field("relay_url", &self.config.relay_url)
            .finish()
    }
}
