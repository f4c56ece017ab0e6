//! Stanzas: the units of application data that Stream Management counts.
//!
//! Only the three top-level stanza kinds participate in acknowledgment.
//! Nonzas (Stream Management's own elements, CSI markers, ...) are never
//! tracked.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Jid;

/// Discriminator for the three countable stanza kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StanzaKind {
    Message,
    Presence,
    Iq,
}

impl StanzaKind {
    /// The element name on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StanzaKind::Message => "message",
            StanzaKind::Presence => "presence",
            StanzaKind::Iq => "iq",
        }
    }

    /// Map an untyped kind name. Anything but the three stanza names is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "message" => Some(StanzaKind::Message),
            "presence" => Some(StanzaKind::Presence),
            "iq" => Some(StanzaKind::Iq),
            _ => None,
        }
    }
}

impl fmt::Display for StanzaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StanzaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("not a stanza kind: {}", s))
    }
}

/// Routing attributes and encoded content of a stanza.
///
/// `payload` holds the already-encoded child elements; producing and
/// interpreting it is the codec layer's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StanzaBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Jid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Jid>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub stanza_type: Option<String>,
    #[serde(default)]
    pub payload: Bytes,
}

impl StanzaBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sender(mut self, jid: impl Into<Jid>) -> Self {
        self.from = Some(jid.into());
        self
    }

    pub fn recipient(mut self, jid: impl Into<Jid>) -> Self {
        self.to = Some(jid.into());
        self
    }

    pub fn stanza_type(mut self, stanza_type: impl Into<String>) -> Self {
        self.stanza_type = Some(stanza_type.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// A countable stanza, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stanza", rename_all = "lowercase")]
pub enum Stanza {
    Message(StanzaBody),
    Presence(StanzaBody),
    Iq(StanzaBody),
}

impl Stanza {
    /// Build a stanza of the given kind.
    pub fn new(kind: StanzaKind, body: StanzaBody) -> Self {
        match kind {
            StanzaKind::Message => Stanza::Message(body),
            StanzaKind::Presence => Stanza::Presence(body),
            StanzaKind::Iq => Stanza::Iq(body),
        }
    }

    pub fn kind(&self) -> StanzaKind {
        match self {
            Stanza::Message(_) => StanzaKind::Message,
            Stanza::Presence(_) => StanzaKind::Presence,
            Stanza::Iq(_) => StanzaKind::Iq,
        }
    }

    pub fn body(&self) -> &StanzaBody {
        match self {
            Stanza::Message(body) | Stanza::Presence(body) | Stanza::Iq(body) => body,
        }
    }

    /// The stanza's `id` attribute, if any.
    pub fn id(&self) -> Option<&str> {
        self.body().id.as_deref()
    }
}
