//! Stream Management state machine.
//!
//! Implements XEP-0198 acknowledgment, windowed ack requests and session
//! resumption on top of a [`SessionState`].
//!
//! ```text
//! Client                              Server
//!   |-------- <enable/> -------------->|   enable()
//!   |<------- <enabled id=../> --------|   enabled()
//!   |-------- stanza ----------------->|   track()
//!   |-------- <r/> ------------------->|   request()   (window reached)
//!   |<------- <a h=../> ---------------|   process()
//!   |<------- stanza ------------------|   handle()
//!   |<------- <r/> --------------------|
//!   |-------- <a h=../> -------------->|   ack()
//!   .            connection lost       .
//!   |-------- <resume previd=../> ---->|   resume()
//!   |<------- <resumed h=../> ---------|   resumed()   (resends the rest)
//! ```
//!
//! Every mutating operation finishes its state change, then awaits the
//! persister with a snapshot of the result before returning.

use std::sync::Arc;

use xmpp_sm_core::{
    Jid, Outbound, SessionId, SessionState, SmRequest, Snapshot, Stanza, StanzaBody, StanzaKind,
    UnackedQueue,
};
use xmpp_sm_store::{NoopPersister, Persister};

use crate::config::SmConfig;
use crate::connection::{Connection, EventSink, SmEvent};
use crate::error::{EngineError, Result};

/// The Stream Management engine for one client connection.
///
/// Methods take `&mut self`, so a single owner drives the engine one
/// operation at a time. Share it across tasks through a handle that holds
/// a lock for the whole operation, persistence included.
pub struct StreamManagement<C: Connection, E: EventSink> {
    /// The connection frames are sent on.
    connection: C,
    /// Where acked/failed/bound notifications go.
    events: E,
    /// Persistence hook, invoked after every transition.
    persister: Arc<dyn Persister>,
    /// Counters, queue and negotiation flags.
    state: SessionState,
}

impl<C: Connection, E: EventSink> StreamManagement<C, E> {
    /// Create an engine with no session and the no-op persister.
    pub fn new(connection: C, events: E, config: SmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connection,
            events,
            persister: Arc::new(NoopPersister),
            state: SessionState::new(config.window_size, config.allow_resume),
        })
    }

    /// Install the persistence hook, discarding the previous one.
    pub fn cache(&mut self, persister: Arc<dyn Persister>) {
        self.persister = persister;
    }

    /// Seed the session from a previously persisted snapshot.
    ///
    /// Resumption is re-enabled. If the snapshot carries a JID, the
    /// connection is rebound to it and [`SmEvent::SessionBound`] is emitted.
    /// The snapshot is trusted as-is.
    pub fn load(&mut self, snapshot: Snapshot) {
        let jid = snapshot.jid.clone();
        tracing::debug!(
            id = ?snapshot.id,
            handled = snapshot.handled,
            last_ack = snapshot.last_ack,
            unacked = snapshot.unacked.len(),
            "loading stream management snapshot"
        );
        self.state.restore(snapshot);

        if let Some(jid) = jid {
            self.connection.bind_jid(jid.clone());
            self.events.emit(SmEvent::SessionBound(jid));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Negotiation
    // ─────────────────────────────────────────────────────────────────────────

    /// Send `<enable/>` and start counting inbound stanzas from zero.
    ///
    /// The unacked queue is left alone, so stanzas restored by [`load`]
    /// stay tracked.
    ///
    /// [`load`]: StreamManagement::load
    pub async fn enable(&mut self) -> Result<()> {
        tracing::debug!(resume = self.state.allow_resume, "enabling stream management");
        self.connection
            .send(SmRequest::Enable {
                resume: self.state.allow_resume,
            }
            .into())
            .await?;
        self.state.handled = 0;
        self.state.outbound_started = true;

        self.persist().await
    }

    /// Send `<resume/>` for the stored session.
    ///
    /// Fails with [`EngineError::NoSession`] when no session id is held. A
    /// server refusing the resumption answers with `<failed/>`, which goes
    /// to [`failed`](StreamManagement::failed).
    pub async fn resume(&mut self) -> Result<()> {
        let previous_session = self.state.id.clone().ok_or(EngineError::NoSession)?;
        tracing::debug!(
            id = %previous_session,
            handled = self.state.handled,
            "resuming stream management session"
        );
        self.connection
            .send(SmRequest::Resume {
                handled: self.state.handled,
                previous_session,
            }
            .into())
            .await?;
        self.state.outbound_started = true;

        self.persist().await
    }

    /// The server confirmed a fresh session.
    pub async fn enabled(&mut self, id: Option<SessionId>) -> Result<()> {
        tracing::debug!(id = ?id, "stream management enabled");
        self.state.id = id;
        self.state.handled = 0;
        self.state.inbound_started = true;

        self.persist().await
    }

    /// The server resumed the session.
    ///
    /// Stanzas the server's count confirms are acked; everything still
    /// queued after that is persisted as unacked, then sent again.
    pub async fn resumed(&mut self, previous_session: SessionId, handled: Option<u32>) -> Result<()> {
        tracing::debug!(id = %previous_session, handled = ?handled, "stream management resumed");
        self.state.id = Some(previous_session);
        let pending = match handled {
            Some(handled) => self.reconcile(handled, true),
            None => Vec::new(),
        };
        self.state.inbound_started = true;

        self.persist().await?;
        self.resend(pending).await?;
        self.request_if_needed().await
    }

    /// Enabling or resuming failed; the session is gone.
    ///
    /// A count in the failure is reconciled first. Whatever is still queued
    /// afterwards is reported as [`SmEvent::StanzaFailed`] in send order and
    /// never retried here.
    pub async fn failed(&mut self, handled: Option<u32>) -> Result<()> {
        if let Some(handled) = handled {
            self.reconcile(handled, false);
        }

        let lost = self.state.reset();
        if !lost.is_empty() {
            tracing::warn!(count = lost.len(), "stream management failed with unacked stanzas");
        } else {
            tracing::debug!("stream management failed");
        }
        for stanza in lost {
            self.events.emit(SmEvent::StanzaFailed(stanza));
        }

        self.persist().await
    }

    /// The connection dropped. Both directions go inactive, and the session
    /// is kept for a later [`resume`](StreamManagement::resume).
    ///
    /// An outstanding `<r/>` died with the old connection, so it no longer
    /// holds back new requests.
    pub fn suspend(&mut self) {
        tracing::debug!(handled = self.state.handled, "stream management suspended");
        self.state.suspend();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Acknowledgment
    // ─────────────────────────────────────────────────────────────────────────

    /// Answer the peer's `<r/>` with our handled count.
    pub async fn ack(&mut self) -> Result<()> {
        self.connection
            .send(SmRequest::Ack {
                handled: self.state.handled,
            }
            .into())
            .await
    }

    /// Send `<r/>`.
    pub async fn request(&mut self) -> Result<()> {
        tracing::debug!(unacked = self.state.unacked.len(), "requesting ack");
        self.state.pending_ack = true;
        if let Err(e) = self.connection.send(SmRequest::Request.into()).await {
            self.state.pending_ack = false;
            return Err(e);
        }
        Ok(())
    }

    /// Reconcile a peer-reported count against the unacked queue.
    ///
    /// `None` is a no-op. Confirmed stanzas are emitted as
    /// [`SmEvent::StanzaAcked`] oldest first. With `resend`, the rest of the
    /// queue is sent again and stays tracked as new sends. The result is
    /// persisted before anything is resent. A new `<r/>` follows if the
    /// window is still full.
    pub async fn process(&mut self, handled: Option<u32>, resend: bool) -> Result<()> {
        let Some(handled) = handled else {
            return Ok(());
        };
        let pending = self.reconcile(handled, resend);

        self.persist().await?;
        self.resend(pending).await?;
        self.request_if_needed().await
    }

    /// Track an outbound stanza.
    ///
    /// Ignored until outbound is active.
    pub async fn track(&mut self, stanza: Stanza) -> Result<()> {
        if !self.state.record_sent(stanza) {
            tracing::trace!("stream management inactive, not tracking stanza");
            return Ok(());
        }

        self.persist().await?;
        self.request_if_needed().await
    }

    /// Track an outbound stanza by kind name. Names other than `message`,
    /// `presence` and `iq` are ignored.
    pub async fn track_named(&mut self, kind: &str, body: StanzaBody) -> Result<()> {
        match StanzaKind::parse(kind) {
            Some(kind) => self.track(Stanza::new(kind, body)).await,
            None => Ok(()),
        }
    }

    /// Count one processed inbound stanza.
    ///
    /// Ignored until inbound is active.
    pub async fn handle(&mut self) -> Result<()> {
        if !self.state.record_handled() {
            return Ok(());
        }

        self.persist().await
    }

    /// No request is outstanding and the queue has reached the window.
    pub fn need_ack(&self) -> bool {
        self.state.needs_ack()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Both directions are active.
    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    pub fn can_resume(&self) -> bool {
        self.state.can_resume()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.state.id.as_ref()
    }

    pub fn handled(&self) -> u32 {
        self.state.handled
    }

    pub fn last_ack(&self) -> u32 {
        self.state.last_ack
    }

    pub fn unacked(&self) -> &UnackedQueue {
        &self.state.unacked
    }

    pub fn is_ack_pending(&self) -> bool {
        self.state.pending_ack
    }

    pub fn window_size(&self) -> usize {
        self.state.window_size
    }

    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        if window_size == 0 {
            return Err(EngineError::InvalidConfig(
                "window_size must be at least 1".into(),
            ));
        }
        self.state.window_size = window_size;
        Ok(())
    }

    pub fn allow_resume(&self) -> bool {
        self.state.allow_resume
    }

    pub fn set_allow_resume(&mut self, allow_resume: bool) {
        self.state.allow_resume = allow_resume;
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// The JID currently bound on the connection.
    pub fn jid(&self) -> Option<Jid> {
        self.connection.bound_jid()
    }

    /// What the persister would be handed right now.
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(self.connection.bound_jid())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply an ack count and emit acked events.
    ///
    /// With `resend`, the rest of the queue is re-tracked as fresh sends and
    /// returned for [`resend`](Self::resend).
    fn reconcile(&mut self, handled: u32, resend: bool) -> Vec<Stanza> {
        let outcome = self.state.apply_ack(handled);
        if outcome.overrun > 0 {
            tracing::warn!(
                handled,
                overrun = outcome.overrun,
                "peer acknowledged more stanzas than were unacked"
            );
        }
        for stanza in outcome.acked {
            self.events.emit(SmEvent::StanzaAcked(stanza));
        }

        if !resend {
            return Vec::new();
        }
        let pending = self.state.unacked.drain_all();
        for stanza in &pending {
            self.state.record_sent(stanza.clone());
        }
        pending
    }

    /// Put already re-tracked stanzas back on the wire, oldest first.
    async fn resend(&self, pending: Vec<Stanza>) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = pending.len(), "resending unacked stanzas");
        for stanza in pending {
            self.connection.send(Outbound::Stanza(stanza)).await?;
        }
        Ok(())
    }

    async fn request_if_needed(&mut self) -> Result<()> {
        if self.state.needs_ack() {
            self.request().await?;
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let snapshot = self.snapshot();
        self.persister.persist(&snapshot).await?;
        Ok(())
    }
}
