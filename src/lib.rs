//! Mailbox RTC - Signaling für Zwei-Parteien WebRTC Sessions
//!
//! Zwei Endpoints ohne gemeinsamen Kanal tauschen Offer, Answer und ICE
//! Candidates über einen Store-and-Forward Relay aus:
//! - `relay`: In-Memory Mailboxen hinter einer HTTP-Oberfläche
//! - `signaling`: Relay-Client, Topics, Wire-Formate, Polling
//! - `session`: Candidate Buffer, Offer/Answer-Ablauf, WebRTC Engine

pub mod config;
pub mod relay;
pub mod session;
pub mod signaling;

pub use config::Config;
pub use relay::{RelayServer, RelayState};
pub use session::{Endpoint, SessionError};
pub use signaling::{HttpRelayClient, Role};

use tracing_subscriber::EnvFilter;

/// Initialisiert das Logging
///
/// `RUST_LOG` hat Vorrang, sonst gilt `mailbox_rtc=info,webrtc=warn`.
pub fn init_logging(verbose: bool) {
    let default_directives = if verbose {
        "mailbox_rtc=debug,webrtc=warn"
    } else {
        "mailbox_rtc=info,webrtc=warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    // Ein zweiter Aufruf (z.B. in Tests) ist harmlos
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
