//! Session state of one Stream Management session.
//!
//! Everything here is synchronous and side-effect free: the engine applies
//! a transition to a [`SessionState`], then does the I/O (sending, emitting,
//! persisting) the transition calls for.

use crate::queue::UnackedQueue;
use crate::seq::{distance, increment};
use crate::snapshot::Snapshot;
use crate::stanza::Stanza;
use crate::types::{Jid, SessionId};

/// Unacknowledged stanzas tolerated before an ack request goes out.
pub const DEFAULT_WINDOW_SIZE: usize = 1;

/// Counters, queue and negotiation flags of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Session id issued by the server on `<enabled/>`.
    pub id: Option<SessionId>,

    /// Whether `<enable/>` asks for resumption.
    pub allow_resume: bool,

    /// Inbound stanzas handled since the session was enabled.
    pub handled: u32,

    /// Outbound stanzas the peer has confirmed, as last reported.
    pub last_ack: u32,

    /// Queue length that triggers an ack request.
    pub window_size: usize,

    /// Outbound stanzas sent since `last_ack`.
    pub unacked: UnackedQueue,

    /// An `<r/>` is outstanding.
    pub pending_ack: bool,

    /// The server confirmed the session (`<enabled/>` / `<resumed/>`).
    pub inbound_started: bool,

    /// We asked for the session (`<enable/>` / `<resume/>`).
    pub outbound_started: bool,
}

/// Result of reconciling a peer-reported ack count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckOutcome {
    /// Stanzas newly confirmed by the peer, oldest first.
    pub acked: Vec<Stanza>,
    /// Confirmations the peer reported beyond what was queued.
    pub overrun: u32,
}

impl SessionState {
    pub fn new(window_size: usize, allow_resume: bool) -> Self {
        Self {
            id: None,
            allow_resume,
            handled: 0,
            last_ack: 0,
            window_size,
            unacked: UnackedQueue::new(),
            pending_ack: false,
            inbound_started: false,
            outbound_started: false,
        }
    }

    /// Both directions are active.
    pub fn is_started(&self) -> bool {
        self.inbound_started && self.outbound_started
    }

    /// No request is outstanding and the queue has reached the window.
    pub fn needs_ack(&self) -> bool {
        !self.pending_ack && self.unacked.len() >= self.window_size
    }

    /// A session id is held and resumption is allowed.
    pub fn can_resume(&self) -> bool {
        self.allow_resume && self.id.is_some()
    }

    /// Count one handled inbound stanza. Returns false when inbound is inactive.
    pub fn record_handled(&mut self) -> bool {
        if !self.inbound_started {
            return false;
        }
        self.handled = increment(self.handled);
        true
    }

    /// Queue an outbound stanza. Returns false when outbound is inactive.
    pub fn record_sent(&mut self, stanza: Stanza) -> bool {
        if !self.outbound_started {
            return false;
        }
        self.unacked.push(stanza);
        true
    }

    /// Retire the stanzas a peer's `handled` count newly confirms.
    ///
    /// Clears the pending request even when nothing new is confirmed.
    pub fn apply_ack(&mut self, handled: u32) -> AckOutcome {
        let confirmed = distance(handled, self.last_ack);
        self.pending_ack = false;

        let mut outcome = AckOutcome::default();
        for retired in 0..confirmed {
            match self.unacked.pop_front() {
                Some(stanza) => outcome.acked.push(stanza),
                None => {
                    outcome.overrun = confirmed - retired;
                    break;
                }
            }
        }
        self.last_ack = handled;
        outcome
    }

    /// Tear the session down to the empty state, returning what was still
    /// unacknowledged.
    pub fn reset(&mut self) -> Vec<Stanza> {
        let unacked = self.unacked.drain_all();
        self.inbound_started = false;
        self.outbound_started = false;
        self.pending_ack = false;
        self.id = None;
        self.last_ack = 0;
        self.handled = 0;
        unacked
    }

    /// Mark both directions inactive, keeping the session for resumption.
    pub fn suspend(&mut self) {
        self.inbound_started = false;
        self.outbound_started = false;
        self.pending_ack = false;
    }

    /// Seed the session from a persisted snapshot.
    ///
    /// Negotiation flags are left alone; the restored session still has to
    /// be resumed on the new connection.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.id = snapshot.id;
        self.allow_resume = true;
        self.handled = snapshot.handled;
        self.last_ack = snapshot.last_ack;
        self.unacked = snapshot.unacked.into();
    }

    /// Capture the persistable part of the session.
    pub fn snapshot(&self, jid: Option<Jid>) -> Snapshot {
        Snapshot {
            id: self.id.clone(),
            handled: self.handled,
            last_ack: self.last_ack,
            jid,
            unacked: self.unacked.to_vec(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stanza::StanzaBody;

    fn message(n: usize) -> Stanza {
        Stanza::Message(StanzaBody::new().id(format!("m{}", n)))
    }

    fn active(window_size: usize) -> SessionState {
        let mut state = SessionState::new(window_size, true);
        state.inbound_started = true;
        state.outbound_started = true;
        state
    }

    #[test]
    fn test_record_sent_requires_outbound() {
        let mut state = SessionState::default();
        assert!(!state.record_sent(message(1)));
        assert!(state.unacked.is_empty());

        state.outbound_started = true;
        assert!(state.record_sent(message(1)));
        assert_eq!(state.unacked.len(), 1);
    }

    #[test]
    fn test_record_handled_requires_inbound() {
        let mut state = SessionState::default();
        assert!(!state.record_handled());
        assert_eq!(state.handled, 0);

        state.inbound_started = true;
        state.handled = u32::MAX;
        assert!(state.record_handled());
        assert_eq!(state.handled, 0);
    }

    #[test]
    fn test_needs_ack_window() {
        let mut state = active(3);
        for n in 1..=3 {
            assert!(!state.needs_ack(), "window not reached after {}", n - 1);
            state.record_sent(message(n));
        }
        assert!(state.needs_ack());

        state.pending_ack = true;
        assert!(!state.needs_ack());
    }

    #[test]
    fn test_apply_ack_retires_front() {
        let mut state = active(10);
        for n in 0..5 {
            state.record_sent(message(n));
        }
        state.pending_ack = true;

        let outcome = state.apply_ack(3);
        let ids: Vec<_> = outcome.acked.iter().map(|s| s.id().unwrap()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
        assert_eq!(outcome.overrun, 0);
        assert_eq!(state.last_ack, 3);
        assert_eq!(state.unacked.front().unwrap().id(), Some("m3"));
        assert!(!state.pending_ack);
    }

    #[test]
    fn test_apply_ack_wraparound() {
        let mut state = active(100);
        state.last_ack = 4_294_967_290;
        for n in 0..12 {
            state.record_sent(message(n));
        }

        let outcome = state.apply_ack(3);
        assert_eq!(outcome.acked.len(), 9);
        assert_eq!(state.unacked.len(), 3);
        assert_eq!(state.last_ack, 3);
    }

    #[test]
    fn test_apply_ack_overrun_stops_at_empty() {
        let mut state = active(10);
        state.record_sent(message(0));

        let outcome = state.apply_ack(4);
        assert_eq!(outcome.acked.len(), 1);
        assert_eq!(outcome.overrun, 3);
        assert_eq!(state.last_ack, 4);
        assert!(state.unacked.is_empty());
    }

    #[test]
    fn test_apply_ack_duplicate_clears_pending() {
        let mut state = active(10);
        state.record_sent(message(0));
        state.last_ack = 7;
        state.pending_ack = true;

        let outcome = state.apply_ack(7);
        assert!(outcome.acked.is_empty());
        assert!(!state.pending_ack);
        assert_eq!(state.unacked.len(), 1);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut state = active(10);
        state.id = Some("abc".into());
        state.handled = 12;
        state.last_ack = 4;
        state.pending_ack = true;
        state.record_sent(message(0));
        state.record_sent(message(1));

        let left = state.reset();
        assert_eq!(left.len(), 2);
        assert_eq!(state.id, None);
        assert_eq!(state.handled, 0);
        assert_eq!(state.last_ack, 0);
        assert!(state.unacked.is_empty());
        assert!(!state.pending_ack);
        assert!(!state.is_started());
    }

    #[test]
    fn test_suspend_keeps_session() {
        let mut state = active(10);
        state.id = Some("abc".into());
        state.handled = 5;
        state.record_sent(message(0));

        state.suspend();
        assert!(!state.is_started());
        assert!(state.can_resume());
        assert_eq!(state.handled, 5);
        assert_eq!(state.unacked.len(), 1);
    }

    #[test]
    fn test_restore_then_snapshot() {
        let mut state = SessionState::new(1, false);
        state.restore(Snapshot {
            id: Some("abc".into()),
            handled: 5,
            last_ack: 2,
            jid: Some("romeo@montague.lit/orchard".into()),
            unacked: vec![message(0), message(1)],
        });

        assert!(state.allow_resume);
        assert!(!state.is_started());

        let snapshot = state.snapshot(None);
        assert_eq!(snapshot.id, Some("abc".into()));
        assert_eq!(snapshot.handled, 5);
        assert_eq!(snapshot.last_ack, 2);
        assert_eq!(snapshot.jid, None);
        assert_eq!(snapshot.unacked.len(), 2);
    }
}
