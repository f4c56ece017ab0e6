//! In-memory persister.
//!
//! Primarily for testing. Besides the latest snapshot it keeps every write
//! in order, so tests can check that persisted history is linear.

use std::sync::RwLock;

use async_trait::async_trait;
use xmpp_sm_core::Snapshot;

use crate::error::Result;
use crate::traits::{Persister, SnapshotSource};

/// In-memory snapshot store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryPersister {
    inner: RwLock<Vec<Snapshot>>,
}

impl MemoryPersister {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Create a store that already holds one snapshot, as if written by a
    /// previous process.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(vec![snapshot]),
        }
    }

    /// Every snapshot written so far, oldest first.
    pub fn history(&self) -> Vec<Snapshot> {
        self.inner.read().unwrap().clone()
    }

    /// Number of writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// The most recent snapshot, without going through the async trait.
    pub fn last(&self) -> Option<Snapshot> {
        self.inner.read().unwrap().last().cloned()
    }
}

impl Default for MemoryPersister {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Persister for MemoryPersister {
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.push(snapshot.clone());
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for MemoryPersister {
    async fn latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.last())
    }
}
