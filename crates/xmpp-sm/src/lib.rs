//! # XMPP Stream Management
//!
//! Client-side XEP-0198: acknowledgment of outbound stanzas, counting of
//! inbound ones, and resumption of a dropped session, with every
//! transition handed to a persister.
//!
//! ## Overview
//!
//! - **Acks**: outbound stanzas are queued until the server confirms them
//! - **Requests**: an `<r/>` goes out whenever the unacked window fills
//! - **Resumption**: a dropped session continues where it left off, and
//!   whatever the server never saw is sent again
//! - **Persistence**: the session survives a process restart
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xmpp_sm::{ChannelSink, MemoryConnection, SmConfig, SmResponse, StreamManager};
//! use xmpp_sm::core::{Stanza, StanzaBody};
//! use xmpp_sm::store::SqlitePersister;
//!
//! async fn example() {
//!     let store = Arc::new(SqlitePersister::open("sm.db", "romeo@montague.lit").unwrap());
//!     let (sink, _events) = ChannelSink::new();
//!     let sm = StreamManager::new(MemoryConnection::new(), sink, SmConfig::default()).unwrap();
//!
//!     // Continue the last session if one was saved
//!     sm.restore(store.as_ref()).await.unwrap();
//!     sm.cache(store).await;
//!     sm.negotiate().await.unwrap();
//!
//!     // Feed nonzas from the server back in
//!     sm.dispatch(SmResponse::Enabled { id: Some("sess-1".into()) })
//!         .await
//!         .unwrap();
//!
//!     sm.track(Stanza::Message(StanzaBody::new().id("m1")))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `xmpp_sm::core` - Counters, stanzas, queue, messages, snapshots
//! - `xmpp_sm::store` - Persistence hooks and the SQLite backend
//! - `xmpp_sm::engine` - The state machine and its capability traits

pub mod error;
pub mod manager;

// Re-export component crates
pub use xmpp_sm_core as core;
pub use xmpp_sm_engine as engine;
pub use xmpp_sm_store as store;

pub use error::{Error, Result};
pub use manager::StreamManager;

// Re-export commonly used types
pub use xmpp_sm_core::{
    Jid, Outbound, SessionId, SmRequest, SmResponse, Snapshot, Stanza, StanzaBody, StanzaKind,
};
pub use xmpp_sm_engine::{
    ChannelSink, Connection, EngineError, EventSink, MemoryConnection, NoopSink, SmConfig,
    SmEvent, StreamManagement,
};
pub use xmpp_sm_store::{MemoryPersister, NoopPersister, Persister, SnapshotSource, SqlitePersister};
