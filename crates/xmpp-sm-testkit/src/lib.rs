//! # XMPP Stream Management Testkit
//!
//! Testing utilities for the Stream Management crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an engine wired to an in-memory connection, event channel
//!   and persister, plus stanza builders
//! - **Generators**: Proptest strategies for stanzas, counters, snapshots
//!   and scripted sessions
//!
//! ## Test Fixtures
//!
//! ```rust
//! use xmpp_sm_testkit::fixtures::{message, SessionFixture};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut fixture = SessionFixture::new();
//! let mut sm = fixture.active_engine(5).await;
//!
//! sm.track(message(1)).await.unwrap();
//! sm.process(Some(1), false).await.unwrap();
//! assert_eq!(fixture.acked_ids(), vec!["m1"]);
//! # });
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use xmpp_sm_testkit::generators::{near_wrap, stanzas};
//!
//! proptest! {
//!     #[test]
//!     fn acks_survive_wraparound(last_ack in near_wrap(), queued in stanzas(20)) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{iq, message, presence, stanza_ids, SessionFixture, TestEngine, ROMEO};
pub use generators::{ScriptOp, SessionScript};
