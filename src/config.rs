//! Laufzeit-Konfiguration
//!
//! Alle Werte haben Defaults, die CLI überschreibt einzelne Felder.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Basis-URL des Relays aus Sicht der Endpoints
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Adresse, an die der Relay gebunden wird
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Wartezeit zwischen zwei Abfragen einer leeren Mailbox
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<String>,
    #[serde(default = "default_data_channel_label")]
    pub data_channel_label: String,
    /// Text, der periodisch über einen offenen Data Channel gesendet wird
    #[serde(default = "default_ping_message")]
    pub ping_message: String,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_relay_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Standard STUN Server (kostenlos)
pub fn default_ice_servers() -> Vec<String> {
    vec!["stun:stun.l.google.com:19302".to_string()]
}

fn default_data_channel_label() -> String {
    "data".to_string()
}

fn default_ping_message() -> String {
    "123456789012345".to_string()
}

fn default_ping_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            bind_address: default_bind_address(),
            poll_interval_ms: default_poll_interval_ms(),
            ice_servers: default_ice_servers(),
            data_channel_label: default_data_channel_label(),
            ping_message: default_ping_message(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Mindestens eine Sekunde, `tokio::time::interval` akzeptiert keine Null
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}
