//! Payload-Formate für das Signaling
//!
//! Session Descriptions reisen als JSON `{"type": "offer", "sdp": "..."}`,
//! Candidates als nackte Candidate-Zeile (UTF-8).

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Fehler beim Dekodieren einer empfangenen Payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed session description: {0}")]
    MalformedDescription(String),

    #[error("Expected {expected} description, got {actual}")]
    UnexpectedKind {
        expected: DescriptionKind,
        actual: DescriptionKind,
    },

    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),
}

// ============================================================================
// SESSION DESCRIPTION
// ============================================================================

/// Art einer Session Description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionKind {
    Offer,
    Answer,
}

impl fmt::Display for DescriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionKind::Offer => write!(f, "offer"),
            DescriptionKind::Answer => write!(f, "answer"),
        }
    }
}

/// Verhandlungsdokument einer Seite (Offer oder Answer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: DescriptionKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Answer,
            sdp: sdp.into(),
        }
    }

    /// Serialisiert für den Relay
    pub fn to_payload(&self) -> Bytes {
        // Ein Struct aus zwei Strings kann nicht fehlschlagen
        Bytes::from(serde_json::to_vec(self).unwrap_or_default())
    }

    /// Dekodiert eine Payload und prüft die erwartete Art
    pub fn from_payload(payload: &[u8], expected: DescriptionKind) -> Result<Self, ProtocolError> {
        let desc: SessionDescription = serde_json::from_slice(payload)
            .map_err(|e| ProtocolError::MalformedDescription(e.to_string()))?;

        if desc.kind != expected {
            return Err(ProtocolError::UnexpectedKind {
                expected,
                actual: desc.kind,
            });
        }

        if desc.sdp.trim().is_empty() {
            return Err(ProtocolError::MalformedDescription("empty sdp".to_string()));
        }

        Ok(desc)
    }
}

// ============================================================================
// CANDIDATES
// ============================================================================

/// Kodiert eine Candidate-Zeile für den Relay
pub fn encode_candidate(candidate: &str) -> Bytes {
    Bytes::copy_from_slice(candidate.as_bytes())
}

/// Dekodiert eine Candidate-Payload
pub fn decode_candidate(payload: &[u8]) -> Result<String, ProtocolError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| ProtocolError::MalformedCandidate(e.to_string()))?
        .trim();

    if text.is_empty() {
        return Err(ProtocolError::MalformedCandidate("empty payload".to_string()));
    }

    Ok(text.to_string())
}
