//! The StreamManager: a shareable handle over one connection's engine.
//!
//! Each call takes the engine lock for the whole operation, persistence
//! included, so transitions never interleave and every persisted snapshot
//! follows from the one before it.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use xmpp_sm_core::{SessionId, SmResponse, Snapshot, Stanza, StanzaBody};
use xmpp_sm_engine::{Connection, EventSink, SmConfig, StreamManagement};
use xmpp_sm_store::{Persister, SnapshotSource};

use crate::error::Result;

/// Cloneable handle to a [`StreamManagement`] engine.
pub struct StreamManager<C: Connection, E: EventSink> {
    inner: Arc<Mutex<StreamManagement<C, E>>>,
}

impl<C: Connection, E: EventSink> Clone for StreamManager<C, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection, E: EventSink> StreamManager<C, E> {
    /// Create a manager for a connection.
    pub fn new(connection: C, events: E, config: SmConfig) -> Result<Self> {
        let engine = StreamManagement::new(connection, events, config)?;
        Ok(Self::from_engine(engine))
    }

    /// Wrap an already configured engine.
    pub fn from_engine(engine: StreamManagement<C, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Exclusive access to the engine until the guard is dropped.
    pub async fn lock(&self) -> MutexGuard<'_, StreamManagement<C, E>> {
        self.inner.lock().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Install the persistence hook.
    pub async fn cache(&self, persister: Arc<dyn Persister>) {
        self.inner.lock().await.cache(persister);
    }

    pub async fn load(&self, snapshot: Snapshot) {
        self.inner.lock().await.load(snapshot);
    }

    /// Load the newest snapshot `source` holds.
    ///
    /// Returns whether there was one.
    pub async fn restore<S>(&self, source: &S) -> Result<bool>
    where
        S: SnapshotSource + ?Sized,
    {
        let Some(snapshot) = source.latest().await? else {
            tracing::debug!("no stream management snapshot to restore");
            return Ok(false);
        };
        self.inner.lock().await.load(snapshot);
        Ok(true)
    }

    /// Resume the held session if possible, otherwise enable a new one.
    pub async fn negotiate(&self) -> Result<()> {
        let mut sm = self.inner.lock().await;
        if sm.can_resume() {
            sm.resume().await?;
        } else {
            sm.enable().await?;
        }
        Ok(())
    }

    pub async fn enable(&self) -> Result<()> {
        Ok(self.inner.lock().await.enable().await?)
    }

    pub async fn resume(&self) -> Result<()> {
        Ok(self.inner.lock().await.resume().await?)
    }

    pub async fn enabled(&self, id: Option<SessionId>) -> Result<()> {
        Ok(self.inner.lock().await.enabled(id).await?)
    }

    pub async fn resumed(&self, previous_session: SessionId, handled: Option<u32>) -> Result<()> {
        Ok(self
            .inner
            .lock()
            .await
            .resumed(previous_session, handled)
            .await?)
    }

    pub async fn failed(&self, handled: Option<u32>) -> Result<()> {
        Ok(self.inner.lock().await.failed(handled).await?)
    }

    /// Mark the connection as dropped, keeping the session.
    pub async fn suspend(&self) {
        self.inner.lock().await.suspend();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inbound
    // ─────────────────────────────────────────────────────────────────────────

    /// Route a nonza received from the peer to its handler.
    pub async fn dispatch(&self, response: SmResponse) -> Result<()> {
        let handled = response.handled();
        let mut sm = self.inner.lock().await;
        match response {
            SmResponse::Enabled { id } => sm.enabled(id).await?,
            SmResponse::Resumed {
                previous_session, ..
            } => sm.resumed(previous_session, handled).await?,
            SmResponse::Failed { .. } => sm.failed(handled).await?,
            SmResponse::Ack { .. } => sm.process(handled, false).await?,
            SmResponse::Request => sm.ack().await?,
        }
        Ok(())
    }

    pub async fn handle(&self) -> Result<()> {
        Ok(self.inner.lock().await.handle().await?)
    }

    pub async fn ack(&self) -> Result<()> {
        Ok(self.inner.lock().await.ack().await?)
    }

    pub async fn process(&self, handled: Option<u32>, resend: bool) -> Result<()> {
        Ok(self.inner.lock().await.process(handled, resend).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outbound
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn track(&self, stanza: Stanza) -> Result<()> {
        Ok(self.inner.lock().await.track(stanza).await?)
    }

    pub async fn track_named(&self, kind: &str, body: StanzaBody) -> Result<()> {
        Ok(self.inner.lock().await.track_named(kind, body).await?)
    }

    pub async fn request(&self) -> Result<()> {
        Ok(self.inner.lock().await.request().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn need_ack(&self) -> bool {
        self.inner.lock().await.need_ack()
    }

    pub async fn is_started(&self) -> bool {
        self.inner.lock().await.is_started()
    }

    pub async fn can_resume(&self) -> bool {
        self.inner.lock().await.can_resume()
    }

    pub async fn set_allow_resume(&self, allow_resume: bool) {
        self.inner.lock().await.set_allow_resume(allow_resume);
    }

    pub async fn set_window_size(&self, window_size: usize) -> Result<()> {
        Ok(self.inner.lock().await.set_window_size(window_size)?)
    }

    pub async fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().await.session_id().cloned()
    }

    pub async fn handled(&self) -> u32 {
        self.inner.lock().await.handled()
    }

    pub async fn last_ack(&self) -> u32 {
        self.inner.lock().await.last_ack()
    }

    pub async fn window_size(&self) -> usize {
        self.inner.lock().await.window_size()
    }

    /// Stanzas awaiting acknowledgment, oldest first.
    pub async fn unacked(&self) -> Vec<Stanza> {
        self.inner.lock().await.unacked().to_vec()
    }

    pub async fn is_ack_pending(&self) -> bool {
        self.inner.lock().await.is_ack_pending()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use xmpp_sm_core::{Outbound, SmRequest};
    use xmpp_sm_engine::{EngineError, MemoryConnection, NoopSink};
    use xmpp_sm_store::MemoryPersister;

    type Manager = StreamManager<Arc<MemoryConnection>, NoopSink>;

    fn manager(window_size: usize) -> (Manager, Arc<MemoryConnection>) {
        let conn = Arc::new(MemoryConnection::bound("romeo@montague.lit/orchard"));
        let config = SmConfig::default().with_window_size(window_size);
        let sm = StreamManager::new(Arc::clone(&conn), NoopSink, config).unwrap();
        (sm, conn)
    }

    fn message(n: usize) -> Stanza {
        Stanza::Message(StanzaBody::new().id(format!("m{}", n)))
    }

    #[tokio::test]
    async fn test_dispatch_routes_responses() {
        let (sm, conn) = manager(10);
        sm.enable().await.unwrap();
        sm.dispatch(SmResponse::Enabled {
            id: Some("sess-1".into()),
        })
        .await
        .unwrap();
        assert!(sm.is_started().await);

        sm.track(message(0)).await.unwrap();
        sm.track(message(1)).await.unwrap();
        sm.dispatch(SmResponse::Ack { handled: 1 }).await.unwrap();
        assert_eq!(sm.unacked().await, vec![message(1)]);

        sm.handle().await.unwrap();
        conn.take_sent();
        sm.dispatch(SmResponse::Request).await.unwrap();
        assert_eq!(
            conn.take_sent(),
            vec![Outbound::Sm(SmRequest::Ack { handled: 1 })]
        );

        sm.dispatch(SmResponse::Failed { handled: None }).await.unwrap();
        assert!(sm.unacked().await.is_empty());
        assert_eq!(sm.session_id().await, None);
    }

    #[tokio::test]
    async fn test_dispatch_resumed_applies_count() {
        let (sm, conn) = manager(10);
        sm.enable().await.unwrap();
        sm.enabled(Some("sess-1".into())).await.unwrap();
        sm.track(message(0)).await.unwrap();
        sm.track(message(1)).await.unwrap();
        sm.suspend().await;
        sm.negotiate().await.unwrap();
        conn.take_sent();

        sm.dispatch(SmResponse::Resumed {
            previous_session: "sess-1".into(),
            handled: Some(1),
        })
        .await
        .unwrap();

        assert_eq!(sm.last_ack().await, 1);
        assert_eq!(sm.unacked().await, vec![message(1)]);
        assert_eq!(conn.take_sent(), vec![Outbound::Stanza(message(1))]);
    }

    #[tokio::test]
    async fn test_negotiate_enables_without_session() {
        let (sm, conn) = manager(1);
        sm.negotiate().await.unwrap();
        assert_eq!(
            conn.sent(),
            vec![Outbound::Sm(SmRequest::Enable { resume: true })]
        );
    }

    #[tokio::test]
    async fn test_negotiate_resumes_restored_session() {
        let (sm, conn) = manager(1);
        let store = MemoryPersister::with_snapshot(Snapshot {
            id: Some("sess-9".into()),
            handled: 4,
            ..Snapshot::default()
        });

        assert!(sm.restore(&store).await.unwrap());
        sm.negotiate().await.unwrap();

        assert_eq!(
            conn.sent(),
            vec![Outbound::Sm(SmRequest::Resume {
                handled: 4,
                previous_session: "sess-9".into(),
            })]
        );
    }

    #[tokio::test]
    async fn test_negotiate_enables_when_resume_disabled() {
        let (sm, conn) = manager(1);
        sm.load(Snapshot {
            id: Some("sess-9".into()),
            ..Snapshot::default()
        })
        .await;
        sm.set_allow_resume(false).await;

        sm.negotiate().await.unwrap();
        assert_eq!(
            conn.sent(),
            vec![Outbound::Sm(SmRequest::Enable { resume: false })]
        );
    }

    #[tokio::test]
    async fn test_restore_from_empty_source() {
        let (sm, _conn) = manager(1);
        let store = MemoryPersister::new();
        assert!(!sm.restore(&store).await.unwrap());
        assert_eq!(sm.session_id().await, None);
    }

    #[tokio::test]
    async fn test_resume_without_session_errors() {
        let (sm, _conn) = manager(1);
        let err = sm.resume().await.unwrap_err();
        assert!(matches!(err, Error::Engine(EngineError::NoSession)));
    }

    #[tokio::test]
    async fn test_clones_share_engine() {
        let (sm, _conn) = manager(10);
        let other = sm.clone();
        sm.enable().await.unwrap();
        other.enabled(Some("sess-1".into())).await.unwrap();

        other.track(message(0)).await.unwrap();
        assert_eq!(sm.unacked().await.len(), 1);
        assert!(sm.lock().await.is_started());
    }

    #[tokio::test]
    async fn test_concurrent_tracks_persist_linearly() {
        let (sm, _conn) = manager(1000);
        let store = Arc::new(MemoryPersister::new());
        sm.cache(store.clone()).await;
        sm.enable().await.unwrap();
        sm.enabled(Some("sess-1".into())).await.unwrap();

        let mut tasks = Vec::new();
        for n in 0..50 {
            let sm = sm.clone();
            tasks.push(tokio::spawn(async move { sm.track(message(n)).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Each write extends the previous one by exactly one stanza.
        let history = store.history();
        let tracked: Vec<_> = history.iter().skip(2).collect();
        assert_eq!(tracked.len(), 50);
        for pair in tracked.windows(2) {
            assert_eq!(pair[1].unacked.len(), pair[0].unacked.len() + 1);
            assert_eq!(pair[1].unacked[..pair[0].unacked.len()], pair[0].unacked[..]);
        }
        assert_eq!(sm.unacked().await.len(), 50);
    }
}
