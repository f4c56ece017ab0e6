//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use xmpp_sm_core::{Stanza, StanzaBody};
use xmpp_sm_engine::{ChannelSink, MemoryConnection, SmConfig, SmEvent, StreamManagement};
use xmpp_sm_store::MemoryPersister;

/// The full JID fixtures bind their connection to.
pub const ROMEO: &str = "romeo@montague.lit/orchard";

/// The engine type every fixture hands out.
pub type TestEngine = StreamManagement<Arc<MemoryConnection>, ChannelSink>;

/// An in-memory connection, event channel and persister an engine can be
/// built on.
pub struct SessionFixture {
    pub connection: Arc<MemoryConnection>,
    pub store: Arc<MemoryPersister>,
    sink: ChannelSink,
    receiver: UnboundedReceiver<SmEvent>,
    seen: Vec<SmEvent>,
}

impl SessionFixture {
    /// A fixture whose connection is bound to [`ROMEO`].
    pub fn new() -> Self {
        let (sink, receiver) = ChannelSink::new();
        Self {
            connection: Arc::new(MemoryConnection::bound(ROMEO)),
            store: Arc::new(MemoryPersister::new()),
            sink,
            receiver,
            seen: Vec::new(),
        }
    }

    /// A fresh engine on this fixture's connection, persisting to its store.
    pub fn engine(&self, window_size: usize) -> TestEngine {
        let config = SmConfig::default().with_window_size(window_size);
        let mut sm = StreamManagement::new(Arc::clone(&self.connection), self.sink.clone(), config)
            .expect("window size must be at least 1");
        sm.cache(self.store.clone());
        sm
    }

    /// An engine that has enabled session `sess-1` in both directions.
    ///
    /// The negotiation frames are cleared from the connection.
    pub async fn active_engine(&self, window_size: usize) -> TestEngine {
        let mut sm = self.engine(window_size);
        sm.enable().await.unwrap();
        sm.enabled(Some("sess-1".into())).await.unwrap();
        self.connection.take_sent();
        sm
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&mut self) -> &[SmEvent] {
        while let Ok(event) = self.receiver.try_recv() {
            self.seen.push(event);
        }
        &self.seen
    }

    /// Forget the events collected so far.
    pub fn clear_events(&mut self) {
        self.events();
        self.seen.clear();
    }

    /// Ids of acked stanzas, in event order.
    pub fn acked_ids(&mut self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                SmEvent::StanzaAcked(stanza) => stanza.id().map(String::from),
                _ => None,
            })
            .collect()
    }

    /// Ids of failed stanzas, in event order.
    pub fn failed_ids(&mut self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                SmEvent::StanzaFailed(stanza) => stanza.id().map(String::from),
                _ => None,
            })
            .collect()
    }
}

impl Default for SessionFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A chat message with id `m{n}`.
pub fn message(n: usize) -> Stanza {
    Stanza::Message(
        StanzaBody::new()
            .id(format!("m{}", n))
            .sender(ROMEO)
            .recipient("juliet@capulet.lit/balcony")
            .stanza_type("chat")
            .payload(format!("<body>message {}</body>", n).into_bytes()),
    )
}

/// A presence with id `p{n}`.
pub fn presence(n: usize) -> Stanza {
    Stanza::Presence(StanzaBody::new().id(format!("p{}", n)))
}

/// An iq get with id `q{n}`.
pub fn iq(n: usize) -> Stanza {
    Stanza::Iq(
        StanzaBody::new()
            .id(format!("q{}", n))
            .recipient("capulet.lit")
            .stanza_type("get"),
    )
}

/// Ids of `stanzas`, skipping any without one.
pub fn stanza_ids<'a>(stanzas: impl IntoIterator<Item = &'a Stanza>) -> Vec<String> {
    stanzas
        .into_iter()
        .filter_map(|stanza| stanza.id().map(String::from))
        .collect()
}
