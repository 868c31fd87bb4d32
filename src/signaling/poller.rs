//! Polling mit festem Intervall
//!
//! Leere Mailboxen und Transport-Fehler werden lokal wiederholt, ohne
//! Backoff und ohne Versuchslimit. Abbruch nur über das Cancel-Token.

use super::client::{SignalingError, SignalingTransport};
use super::topics::Topic;
use bytes::Bytes;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Wiederholende Abfrage eines Topics
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self { interval, cancel }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wartet bis eine Payload auf dem Topic liegt
    ///
    /// Gibt `Ok(None)` nur zurück, wenn abgebrochen wurde.
    pub async fn next<T>(&self, transport: &T, topic: &Topic) -> Result<Option<Bytes>, SignalingError>
    where
        T: SignalingTransport + ?Sized,
    {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            match transport.consume(topic).await {
                Ok(Some(payload)) => return Ok(Some(payload)),
                Ok(None) => {
                    tracing::trace!("Nothing on {}, retrying in {:?}", topic, self.interval);
                }
                Err(e) if e.is_transport() => {
                    tracing::warn!("Polling {} failed: {}", topic, e);
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
