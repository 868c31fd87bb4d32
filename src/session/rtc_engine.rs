//! WebRTC Engine
//!
//! `PeerEngine` über einer webrtc-rs `RTCPeerConnection`. Alle Callbacks
//! der Peer Connection werden in `EngineEvent`s übersetzt.
//!
//! Remote Candidates, die vor der Remote Description eintreffen, werden
//! zurückgehalten und beim Setzen der Description in Reihenfolge angewendet.

use super::engine::{EngineError, EngineEvent, PeerEngine};
use crate::config::Config;
use crate::signaling::{DescriptionKind, SessionDescription};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

fn rtc_err(e: webrtc::Error) -> EngineError {
    EngineError::WebRTC(e.to_string())
}

// ============================================================================
// SDP CONVERSION
// ============================================================================

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription, EngineError> {
    let result = match desc.kind {
        DescriptionKind::Offer => RTCSessionDescription::offer(desc.sdp),
        DescriptionKind::Answer => RTCSessionDescription::answer(desc.sdp),
    };
    result.map_err(|e| EngineError::InvalidSdp(e.to_string()))
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription, EngineError> {
    match desc.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
        other => Err(EngineError::InvalidSdp(format!(
            "unsupported description type {}",
            other
        ))),
    }
}

// ============================================================================
// WEBRTC ENGINE
// ============================================================================

/// Peer Connection mit Data Channels
pub struct WebRtcEngine {
    pc: Arc<RTCPeerConnection>,
    channels: Arc<Mutex<Vec<Arc<RTCDataChannel>>>>,
    /// Candidates ohne Remote Description, geschützt zusammen mit deren Setzen
    pending_candidates: tokio::sync::Mutex<Vec<RTCIceCandidateInit>>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl WebRtcEngine {
    /// Erstellt eine neue Peer Connection und registriert alle Handler
    pub async fn new(
        config: &Config,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self, EngineError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(rtc_err)?;

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine).map_err(rtc_err)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|url| RTCIceServer {
                    urls: vec![url.clone()],
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await.map_err(rtc_err)?);

        let engine = Self {
            pc,
            channels: Arc::new(Mutex::new(Vec::new())),
            pending_candidates: tokio::sync::Mutex::new(Vec::new()),
            event_tx,
        };
        engine.setup_peer_connection_handlers();

        Ok(engine)
    }

    /// Registriert Event Handler für die Peer Connection
    fn setup_peer_connection_handlers(&self) {
        // ICE Candidate Handler
        let event_tx = self.event_tx.clone();
        self.pc
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let event_tx = event_tx.clone();
                Box::pin(async move {
                    let line = match candidate {
                        Some(c) => match c.to_json() {
                            Ok(init) => Some(init.candidate),
                            Err(e) => {
                                tracing::warn!("Failed to serialize local candidate: {}", e);
                                return;
                            }
                        },
                        None => None,
                    };
                    let _ = event_tx.send(EngineEvent::LocalCandidate(line)).await;
                })
            }));

        // ICE Connection State Handler
        let event_tx = self.event_tx.clone();
        self.pc
            .on_ice_connection_state_change(Box::new(move |state: RTCIceConnectionState| {
                let event_tx = event_tx.clone();
                Box::pin(async move {
                    let _ = event_tx
                        .send(EngineEvent::ConnectionStateChanged(state.to_string()))
                        .await;
                })
            }));

        // Eingehende Data Channels (Responder-Seite)
        let event_tx = self.event_tx.clone();
        let channels = Arc::clone(&self.channels);
        self.pc
            .on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
                let event_tx = event_tx.clone();
                let channels = Arc::clone(&channels);
                Box::pin(async move {
                    tracing::info!("New DataChannel {} {}", dc.label(), dc.id());
                    Self::setup_channel_handlers(&dc, event_tx);
                    channels.lock().push(dc);
                })
            }));
    }

    /// Registriert Open/Message Handler für einen Data Channel
    fn setup_channel_handlers(dc: &Arc<RTCDataChannel>, event_tx: mpsc::Sender<EngineEvent>) {
        let label = dc.label().to_string();

        let open_tx = event_tx.clone();
        let open_label = label.clone();
        dc.on_open(Box::new(move || {
            let event_tx = open_tx.clone();
            let label = open_label.clone();
            Box::pin(async move {
                let _ = event_tx.send(EngineEvent::ChannelOpened { label }).await;
            })
        }));

        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let event_tx = event_tx.clone();
            let label = label.clone();
            Box::pin(async move {
                let text = String::from_utf8_lossy(&msg.data).into_owned();
                let _ = event_tx
                    .send(EngineEvent::MessageReceived { label, text })
                    .await;
            })
        }));
    }

    fn channel(&self, label: &str) -> Option<Arc<RTCDataChannel>> {
        self.channels
            .lock()
            .iter()
            .find(|dc| dc.label() == label)
            .cloned()
    }
}

#[async_trait]
impl PeerEngine for WebRtcEngine {
    async fn create_offer(&self) -> Result<SessionDescription, EngineError> {
        let offer = self.pc.create_offer(None).await.map_err(rtc_err)?;
        from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, EngineError> {
        let answer = self.pc.create_answer(None).await.map_err(rtc_err)?;
        from_rtc(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        self.pc
            .set_local_description(to_rtc(desc)?)
            .await
            .map_err(rtc_err)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let mut pending = self.pending_candidates.lock().await;
        self.pc
            .set_remote_description(to_rtc(desc)?)
            .await
            .map_err(rtc_err)?;

        if !pending.is_empty() {
            tracing::debug!("Applying {} early remote candidates", pending.len());
        }
        for candidate in pending.drain(..) {
            self.pc.add_ice_candidate(candidate).await.map_err(rtc_err)?;
        }
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: String) -> Result<(), EngineError> {
        let init = RTCIceCandidateInit {
            candidate,
            ..Default::default()
        };

        let mut pending = self.pending_candidates.lock().await;
        if self.pc.remote_description().await.is_none() {
            pending.push(init);
            return Ok(());
        }
        self.pc.add_ice_candidate(init).await.map_err(rtc_err)
    }

    async fn open_data_channel(&self, label: &str) -> Result<(), EngineError> {
        let dc = self
            .pc
            .create_data_channel(label, None)
            .await
            .map_err(rtc_err)?;
        Self::setup_channel_handlers(&dc, self.event_tx.clone());
        self.channels.lock().push(dc);
        Ok(())
    }

    async fn send_text(&self, label: &str, text: String) -> Result<(), EngineError> {
        let dc = self
            .channel(label)
            .ok_or_else(|| EngineError::NoDataChannel(label.to_string()))?;
        dc.send_text(text).await.map_err(rtc_err)?;
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            tracing::warn!("Failed to close peer connection: {}", e);
        }
    }
}

impl std::fmt::Debug for WebRtcEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRtcEngine")
            .field("connection_state", &self.pc.connection_state())
            .field("channels", &self.channels.lock().len())
            .finish()
    }
}
