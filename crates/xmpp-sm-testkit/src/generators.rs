//! Proptest generators for property-based testing.

use proptest::prelude::*;

use xmpp_sm_core::{Jid, SessionId, Snapshot, Stanza, StanzaBody, StanzaKind};

/// Generate a StanzaKind.
pub fn stanza_kind() -> impl Strategy<Value = StanzaKind> {
    prop_oneof![
        Just(StanzaKind::Message),
        Just(StanzaKind::Presence),
        Just(StanzaKind::Iq),
    ]
}

/// Generate a stanza id.
pub fn stanza_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_map(String::from)
}

/// Generate a full JID.
pub fn jid() -> impl Strategy<Value = Jid> {
    ("[a-z]{1,8}", "[a-z]{1,8}", "[a-z0-9]{1,6}").prop_map(|(local, domain, resource)| {
        Jid::new(format!("{}@{}.lit/{}", local, domain, resource))
    })
}

/// Generate a session id.
pub fn session_id() -> impl Strategy<Value = SessionId> {
    "[A-Za-z0-9]{4,16}".prop_map(SessionId::new)
}

/// Generate a stanza with an id and a small payload.
pub fn stanza() -> impl Strategy<Value = Stanza> {
    (
        stanza_kind(),
        stanza_id(),
        proptest::option::of(jid()),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(kind, id, to, payload)| {
            let mut body = StanzaBody::new().id(id).payload(payload);
            body.to = to;
            Stanza::new(kind, body)
        })
}

/// Generate up to `max_len` stanzas.
pub fn stanzas(max_len: usize) -> impl Strategy<Value = Vec<Stanza>> {
    prop::collection::vec(stanza(), 0..=max_len)
}

/// Generate any counter value.
pub fn counter() -> impl Strategy<Value = u32> {
    any::<u32>()
}

/// Generate a counter within 64 of wrapping.
pub fn near_wrap() -> impl Strategy<Value = u32> {
    (u32::MAX - 64)..=u32::MAX
}

/// Generate a persistable snapshot.
pub fn snapshot() -> impl Strategy<Value = Snapshot> {
    (
        proptest::option::of(session_id()),
        counter(),
        counter(),
        proptest::option::of(jid()),
        stanzas(8),
    )
        .prop_map(|(id, handled, last_ack, jid, unacked)| Snapshot {
            id,
            handled,
            last_ack,
            jid,
            unacked,
        })
}

/// One step of a scripted session.
#[derive(Debug, Clone)]
pub enum ScriptOp {
    /// Send and track a stanza.
    Track(Stanza),
    /// An inbound stanza was handled.
    Handle,
    /// The peer acks `n` more stanzas, capped at what is outstanding.
    Ack(u32),
    /// The peer repeats its last ack.
    DuplicateAck,
    /// The peer sends `<r/>`.
    PeerRequest,
}

fn script_op() -> impl Strategy<Value = ScriptOp> {
    prop_oneof![
        4 => stanza().prop_map(ScriptOp::Track),
        2 => Just(ScriptOp::Handle),
        2 => (0u32..6).prop_map(ScriptOp::Ack),
        1 => Just(ScriptOp::DuplicateAck),
        1 => Just(ScriptOp::PeerRequest),
    ]
}

/// A window size, a starting ack counter and a sequence of operations on an
/// active session.
#[derive(Debug, Clone)]
pub struct SessionScript {
    pub window_size: usize,
    /// `last_ack` the session starts from; often close to wrapping.
    pub start: u32,
    pub ops: Vec<ScriptOp>,
}

impl Arbitrary for SessionScript {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1usize..=8,
            prop_oneof![counter(), near_wrap()],
            prop::collection::vec(script_op(), 0..64),
        )
            .prop_map(|(window_size, start, ops)| SessionScript {
                window_size,
                start,
                ops,
            })
            .boxed()
    }
}
