//! Persistence hook traits.
//!
//! These let the engine stay storage-agnostic. A persister is written to,
//! never read from, by the engine; reading back is a separate concern of
//! whoever restores the session.

use std::sync::Arc;

use async_trait::async_trait;
use xmpp_sm_core::Snapshot;

use crate::error::Result;

/// The hook the engine awaits after every state transition.
///
/// Errors propagate to the caller of the operation that triggered the
/// write.
#[async_trait]
pub trait Persister: Send + Sync {
    /// Store the latest snapshot, replacing any previous one.
    async fn persist(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Read side of a snapshot store.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The most recently persisted snapshot, if any.
    async fn latest(&self) -> Result<Option<Snapshot>>;
}

#[async_trait]
impl<P: Persister + ?Sized> Persister for Arc<P> {
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).persist(snapshot).await
    }
}

#[async_trait]
impl<S: SnapshotSource + ?Sized> SnapshotSource for Arc<S> {
    async fn latest(&self) -> Result<Option<Snapshot>> {
        (**self).latest().await
    }
}

/// Discards every snapshot. The engine's default hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersister;

#[async_trait]
impl Persister for NoopPersister {
    async fn persist(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }
}

/// Adapts a synchronous closure into a [`Persister`].
///
/// ```
/// use xmpp_sm_store::FnPersister;
///
/// let hook = FnPersister::new(|snapshot| {
///     println!("handled = {}", snapshot.handled);
///     Ok(())
/// });
/// # let _ = hook;
/// ```
pub struct FnPersister<F> {
    f: F,
}

impl<F> FnPersister<F>
where
    F: Fn(&Snapshot) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Persister for FnPersister<F>
where
    F: Fn(&Snapshot) -> Result<()> + Send + Sync,
{
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        (self.f)(snapshot)
    }
}
