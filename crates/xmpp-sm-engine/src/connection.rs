//! Connection and event capabilities the engine is given at construction.
//!
//! The connection owns the socket, framing and codec. The engine only asks
//! it to put decoded frames on the wire and to read or rebind the JID.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use xmpp_sm_core::{Jid, Outbound, Stanza};

use crate::error::Result;

/// The part of a client connection Stream Management needs.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Connection: Send + Sync {
    /// Put a frame on the wire.
    async fn send(&self, frame: Outbound) -> Result<()>;

    /// The full JID currently bound, if any.
    fn bound_jid(&self) -> Option<Jid>;

    /// Rebind the connection's JID, e.g. from a restored snapshot.
    fn bind_jid(&self, jid: Jid);
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Arc<C> {
    async fn send(&self, frame: Outbound) -> Result<()> {
        (**self).send(frame).await
    }

    fn bound_jid(&self) -> Option<Jid> {
        (**self).bound_jid()
    }

    fn bind_jid(&self, jid: Jid) {
        (**self).bind_jid(jid)
    }
}

/// Local notifications published by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmEvent {
    /// The peer confirmed receipt of this stanza.
    StanzaAcked(Stanza),
    /// The session failed before this stanza was confirmed.
    StanzaFailed(Stanza),
    /// A restored snapshot rebound the connection to this JID.
    SessionBound(Jid),
}

/// Where the engine publishes [`SmEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SmEvent);
}

impl<E: EventSink + ?Sized> EventSink for Arc<E> {
    fn emit(&self, event: SmEvent) {
        (**self).emit(event)
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: SmEvent) {}
}

/// Forwards events into an unbounded channel.
///
/// Events emitted after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SmEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SmEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: SmEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

/// A simple in-memory connection for testing.
///
/// Records every frame it is asked to send.
pub mod memory {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, RwLock};

    use crate::error::EngineError;

    #[derive(Default)]
    pub struct MemoryConnection {
        sent: Mutex<Vec<Outbound>>,
        jid: RwLock<Option<Jid>>,
        offline: AtomicBool,
    }

    impl MemoryConnection {
        pub fn new() -> Self {
            Self::default()
        }

        /// A connection that has already bound `jid`.
        pub fn bound(jid: impl Into<Jid>) -> Self {
            let conn = Self::default();
            *conn.jid.write().unwrap() = Some(jid.into());
            conn
        }

        /// Every frame sent so far.
        pub fn sent(&self) -> Vec<Outbound> {
            self.sent.lock().unwrap().clone()
        }

        /// Take and clear the frames sent so far.
        pub fn take_sent(&self) -> Vec<Outbound> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }

        /// While offline, every send fails with a transport error.
        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Connection for MemoryConnection {
        async fn send(&self, frame: Outbound) -> Result<()> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(EngineError::Transport("connection offline".into()));
            }
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }

        fn bound_jid(&self) -> Option<Jid> {
            self.jid.read().unwrap().clone()
        }

        fn bind_jid(&self, jid: Jid) {
            *self.jid.write().unwrap() = Some(jid);
        }
    }
}
