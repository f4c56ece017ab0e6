//! # XMPP Stream Management Store
//!
//! Persistence for Stream Management snapshots. The engine only ever calls
//! a [`Persister`]; restoring a session after a restart reads from a
//! [`SnapshotSource`].
//!
//! ## Key Types
//!
//! - [`Persister`] - The async hook invoked after every state transition
//! - [`SnapshotSource`] - Where a restarted client finds its last snapshot
//! - [`NoopPersister`] - The default hook; discards everything
//! - [`FnPersister`] - Adapts a plain closure into a hook
//! - [`MemoryPersister`] - Keeps the full write history in memory
//! - [`SqlitePersister`] - One CBOR snapshot row per account in SQLite
//!
//! ## Usage
//!
//! ```rust,no_run
//! use xmpp_sm_store::{SqlitePersister, SnapshotSource};
//!
//! async fn example() {
//!     let store = SqlitePersister::open("sm.db", "romeo@montague.lit").unwrap();
//!
//!     if let Some(snapshot) = store.latest().await.unwrap() {
//!         println!("resumable session: {:?}", snapshot.id);
//!     }
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryPersister;
pub use sqlite::SqlitePersister;
pub use traits::{FnPersister, NoopPersister, Persister, SnapshotSource};
