//! Schnittstelle zur Peer-Connection-Engine
//!
//! Die Engine ist ein externer Kollaborateur. Aufrufe laufen über
//! `PeerEngine`, Callbacks kommen als `EngineEvent` über einen Channel.

use crate::signaling::SessionDescription;
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("WebRTC error: {0}")]
    WebRTC(String),

    #[error("Invalid SDP: {0}")]
    InvalidSdp(String),

    #[error("No data channel with label '{0}'")]
    NoDataChannel(String),
}

// ============================================================================
// ENGINE EVENTS
// ============================================================================

/// Events die von der Engine ausgelöst werden
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Lokaler Candidate entdeckt, `None` = Gathering abgeschlossen
    LocalCandidate(Option<String>),

    /// ICE-Verbindungsstatus hat sich geändert
    ConnectionStateChanged(String),

    /// Data Channel ist offen
    ChannelOpened { label: String },

    /// Textnachricht auf einem Data Channel empfangen
    MessageReceived { label: String, text: String },
}

// ============================================================================
// ENGINE TRAIT
// ============================================================================

/// Fähigkeiten, die die Session von der Engine benötigt
#[async_trait]
pub trait PeerEngine: Send + Sync + 'static {
    async fn create_offer(&self) -> Result<SessionDescription, EngineError>;

    async fn create_answer(&self) -> Result<SessionDescription, EngineError>;

    /// Setzt die lokale Description (startet das ICE Gathering)
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError>;

    async fn add_remote_candidate(&self, candidate: String) -> Result<(), EngineError>;

    /// Öffnet einen Data Channel (nur auf Initiator-Seite)
    async fn open_data_channel(&self, label: &str) -> Result<(), EngineError>;

    async fn send_text(&self, label: &str, text: String) -> Result<(), EngineError>;

    async fn close(&self);
}
