//! # XMPP Stream Management Core
//!
//! Pure primitives for XEP-0198 Stream Management: wrapping sequence
//! counters, stanzas, the unacknowledged queue, wire messages, session
//! state and persistence snapshots.
//!
//! This crate contains no I/O, no storage, no networking. The engine that
//! drives these types against a live connection lives in `xmpp-sm-engine`.
//!
//! ## Key Types
//!
//! - [`Stanza`] - A message, presence or iq carrying its [`StanzaBody`]
//! - [`UnackedQueue`] - Outbound stanzas awaiting acknowledgment, in send order
//! - [`SessionState`] - Counters, queue and negotiation flags of one session
//! - [`Snapshot`] - What gets handed to a persister after every transition
//! - [`SmRequest`] / [`SmResponse`] - Stream Management nonzas
//!
//! ## Counters
//!
//! Both `handled` and `last_ack` live in the 32-bit sequence space defined
//! by XEP-0198. See [`seq`] for the modular helpers.

pub mod error;
pub mod messages;
pub mod queue;
pub mod seq;
pub mod snapshot;
pub mod stanza;
pub mod state;
pub mod types;

pub use error::{CoreError, Result};
pub use messages::{Outbound, SmRequest, SmResponse};
pub use queue::UnackedQueue;
pub use seq::{distance, increment};
pub use snapshot::Snapshot;
pub use stanza::{Stanza, StanzaBody, StanzaKind};
pub use state::{AckOutcome, SessionState, DEFAULT_WINDOW_SIZE};
pub use types::{Jid, SessionId};
