//! Topic-Namen für den Relay
//!
//! Jede Rolle besitzt einen Slot (`offer` bzw. `answer`). Ein Endpoint
//! schreibt in die Topics seines eigenen Slots und liest die des Peers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rolle eines Endpoints in der Session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Erstellt das Offer
    Initiator,
    /// Beantwortet das Offer
    Responder,
}

impl Role {
    /// Slot-Name der eigenen Mailboxen
    pub fn slot(self) -> &'static str {
        match self {
            Role::Initiator => "offer",
            Role::Responder => "answer",
        }
    }

    pub fn peer(self) -> Role {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }

    /// Topic, auf dem diese Rolle ihre Session Description veröffentlicht
    pub fn outbound_sdp(self) -> Topic {
        Topic::new(TopicFamily::Sdp, self.slot())
    }

    /// Topic, auf dem diese Rolle ihre Candidates veröffentlicht
    pub fn outbound_candidates(self) -> Topic {
        Topic::new(TopicFamily::Candidate, self.slot())
    }

    /// Topic mit der Session Description des Peers
    pub fn inbound_sdp(self) -> Topic {
        self.peer().outbound_sdp()
    }

    /// Topic mit den Candidates des Peers
    pub fn inbound_candidates(self) -> Topic {
        self.peer().outbound_candidates()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}

/// Topic-Familie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicFamily {
    Sdp,
    Candidate,
}

impl TopicFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            TopicFamily::Sdp => "sdp",
            TopicFamily::Candidate => "candidate",
        }
    }
}

/// Ein Relay-Topic, auf dem Draht als `<family>/<slot>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    family: TopicFamily,
    slot: String,
}

impl Topic {
    pub fn new(family: TopicFamily, slot: impl Into<String>) -> Self {
        Self {
            family,
            slot: slot.into(),
        }
    }

    pub fn family(&self) -> TopicFamily {
        self.family
    }

    /// Relativer Pfad auf dem Relay
    pub fn path(&self) -> String {
        format!("{}/{}", self.family.as_str(), self.slot)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family.as_str(), self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiator_topics() {
        let role = Role::Initiator;
        assert_eq!(role.outbound_sdp().path(), "sdp/offer");
        assert_eq!(role.outbound_candidates().path(), "candidate/offer");
        assert_eq!(role.inbound_sdp().path(), "sdp/answer");
        assert_eq!(role.inbound_candidates().path(), "candidate/answer");
    }

    #[test]
    fn test_roles_mirror_each_other() {
        for role in [Role::Initiator, Role::Responder] {
            assert_eq!(role.outbound_sdp(), role.peer().inbound_sdp());
            assert_eq!(role.outbound_candidates(), role.peer().inbound_candidates());
            assert_ne!(role.inbound_sdp(), role.outbound_sdp());
        }
    }

    #[test]
    fn test_display_matches_path() {
        let topic = Topic::new(TopicFamily::Candidate, "answer");
        assert_eq!(topic.to_string(), topic.path());
        assert_eq!(Role::Responder.to_string(), "responder");
    }
}
