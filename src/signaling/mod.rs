//! Signaling Module - Client-Seite des Mailbox-Relays
//!
//! Dieses Modul verwaltet die Kommunikation mit dem Relay:
//! - Topic-Namen pro Rolle (`sdp/<slot>`, `candidate/<slot>`)
//! - Publish/Consume über HTTP oder direkt gegen einen lokalen Relay
//! - Wire-Format der Session Descriptions
//! - Abbrechbares Polling mit festem Intervall

mod client;
mod messages;
mod poller;
mod topics;

pub use client::{HttpRelayClient, LocalRelay, SignalingError, SignalingTransport};
pub use messages::*;
pub use poller::Poller;
pub use topics::{Role, Topic, TopicFamily};
