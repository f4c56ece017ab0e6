//! Persistence snapshots.
//!
//! A [`Snapshot`] is what survives a process restart: enough to resume the
//! session on a new connection and to re-report or resend what was still in
//! flight. The storage format is the persister's business; [`Snapshot::to_cbor`]
//! is the canonical binary form used by the bundled backends.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::stanza::Stanza;
use crate::types::{Jid, SessionId};

/// Persistable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Session id to resume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SessionId>,

    /// Inbound stanzas handled.
    pub handled: u32,

    /// Outbound stanzas last confirmed by the peer.
    pub last_ack: u32,

    /// Full JID bound on the connection that owned the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jid: Option<Jid>,

    /// Unacknowledged outbound stanzas, oldest first.
    #[serde(default)]
    pub unacked: Vec<Stanza>,
}

impl Snapshot {
    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR produced by [`Snapshot::to_cbor`].
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
