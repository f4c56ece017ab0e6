//! Stream Management wire messages.
//!
//! These are the decoded forms of the `urn:xmpp:sm:3` nonzas. Their XML
//! encoding belongs to the codec layer.

use serde::{Deserialize, Serialize};

use crate::stanza::Stanza;
use crate::types::SessionId;

/// Nonzas this side sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SmRequest {
    /// `<enable/>`: start a fresh session.
    Enable {
        /// Ask the server to allow later resumption.
        resume: bool,
    },

    /// `<resume/>`: continue a previous session.
    Resume {
        /// Inbound stanzas we handled in the previous session.
        handled: u32,
        previous_session: SessionId,
    },

    /// `<a/>`: answer the peer's ack request.
    Ack { handled: u32 },

    /// `<r/>`: ask the peer to acknowledge.
    Request,
}

/// Nonzas the peer sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SmResponse {
    /// `<enabled/>`. Servers omit the id when they will not allow resumption.
    Enabled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<SessionId>,
    },

    /// `<resumed/>`.
    Resumed {
        previous_session: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handled: Option<u32>,
    },

    /// `<failed/>`. May still report how far the old session got.
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handled: Option<u32>,
    },

    /// `<a/>`.
    Ack { handled: u32 },

    /// `<r/>`.
    Request,
}

impl SmResponse {
    /// The ack count carried by this message, if any.
    pub fn handled(&self) -> Option<u32> {
        match self {
            SmResponse::Resumed { handled, .. } | SmResponse::Failed { handled } => *handled,
            SmResponse::Ack { handled } => Some(*handled),
            SmResponse::Enabled { .. } | SmResponse::Request => None,
        }
    }
}

/// Everything the engine asks the connection to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A Stream Management nonza.
    Sm(SmRequest),
    /// A stanza re-sent after resumption.
    Stanza(Stanza),
}

impl From<SmRequest> for Outbound {
    fn from(request: SmRequest) -> Self {
        Outbound::Sm(request)
    }
}

impl From<Stanza> for Outbound {
    fn from(stanza: Stanza) -> Self {
        Outbound::Stanza(stanza)
    }
}
