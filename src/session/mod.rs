//! Session Module - Ablauf auf einem Endpoint
//!
//! Dieses Modul verwaltet:
//! - Die Schnittstelle zur Peer-Connection-Engine (WebRTC)
//! - Den Candidate Buffer (Pending Queue bis zur Remote Description)
//! - Den Offer/Answer-Ablauf pro Rolle
//! - Die Verdrahtung aller Tasks einer Session

mod candidates;
mod endpoint;
mod engine;
mod negotiator;
mod rtc_engine;

pub use candidates::{BufferState, CandidateBuffer, Dispatch};
pub use endpoint::Endpoint;
pub use engine::{EngineError, EngineEvent, PeerEngine};
pub use negotiator::{NegotiationOutcome, Negotiator, SessionError};
pub use rtc_engine::WebRtcEngine;
