//! # XMPP Stream Management Engine
//!
//! Drives XEP-0198 acknowledgment and resumption for one client
//! connection.
//!
//! ## Key Types
//!
//! - [`StreamManagement`] - The state machine; one per connection
//! - [`Connection`] - Puts frames on the wire and holds the bound JID
//! - [`EventSink`] - Receives [`SmEvent`]s for acked, failed and rebound state
//! - [`SmConfig`] - Window size and resumption preference
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xmpp_sm_engine::{ChannelSink, MemoryConnection, SmConfig, StreamManagement};
//! use xmpp_sm_core::{Stanza, StanzaBody};
//! use xmpp_sm_store::SqlitePersister;
//!
//! async fn example() {
//!     let (sink, _events) = ChannelSink::new();
//!     let mut sm = StreamManagement::new(MemoryConnection::new(), sink, SmConfig::default())
//!         .unwrap();
//!     sm.cache(Arc::new(SqlitePersister::open("sm.db", "romeo@montague.lit").unwrap()));
//!
//!     sm.enable().await.unwrap();
//!     sm.enabled(Some("sess-1".into())).await.unwrap();
//!     sm.track(Stanza::Message(StanzaBody::new().id("m1"))).await.unwrap();
//! }
//! ```

pub mod config;
pub mod connection;
pub mod engine;
pub mod error;

pub use config::SmConfig;
pub use connection::memory::MemoryConnection;
pub use connection::{ChannelSink, Connection, EventSink, NoopSink, SmEvent};
pub use engine::StreamManagement;
pub use error::{EngineError, Result};
