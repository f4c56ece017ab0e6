//! End-to-end sessions through the manager: negotiation, acks, a dropped
//! connection, a process restart from SQLite and resumption.

use std::sync::Arc;

use xmpp_sm::store::SqlitePersister;
use xmpp_sm::{
    ChannelSink, MemoryConnection, Outbound, SmConfig, SmEvent, SmRequest, SmResponse,
    SnapshotSource, StreamManager,
};
use xmpp_sm_testkit::{iq, message, presence, stanza_ids, SessionFixture, ROMEO};

const ACCOUNT: &str = "romeo@montague.lit";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn stanza_frames(sent: &[Outbound]) -> Vec<String> {
    sent.iter()
        .filter_map(|frame| match frame {
            Outbound::Stanza(stanza) => stanza.id().map(String::from),
            Outbound::Sm(_) => None,
        })
        .collect()
}

#[tokio::test]
async fn test_enable_track_and_ack() {
    init_tracing();
    let mut fixture = SessionFixture::new();
    let sm = StreamManager::from_engine(fixture.engine(2));

    sm.negotiate().await.unwrap();
    sm.dispatch(SmResponse::Enabled {
        id: Some("sess-1".into()),
    })
    .await
    .unwrap();
    assert_eq!(
        fixture.connection.take_sent(),
        vec![Outbound::Sm(SmRequest::Enable { resume: true })]
    );

    sm.track(message(0)).await.unwrap();
    assert!(fixture.connection.sent().is_empty());
    sm.track(presence(1)).await.unwrap();
    assert_eq!(
        fixture.connection.take_sent(),
        vec![Outbound::Sm(SmRequest::Request)]
    );

    sm.dispatch(SmResponse::Ack { handled: 2 }).await.unwrap();
    assert_eq!(fixture.acked_ids(), vec!["m0", "p1"]);
    assert!(sm.unacked().await.is_empty());
    assert!(!sm.is_ack_pending().await);

    // Inbound counting and answering the server's request.
    for _ in 0..3 {
        sm.handle().await.unwrap();
    }
    sm.dispatch(SmResponse::Request).await.unwrap();
    assert_eq!(
        fixture.connection.take_sent(),
        vec![Outbound::Sm(SmRequest::Ack { handled: 3 })]
    );
}

#[tokio::test]
async fn test_restart_from_sqlite_and_resume() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sm.db");

    // First process: enable, handle two stanzas, send four, get one acked.
    {
        let fixture = SessionFixture::new();
        let sm = StreamManager::from_engine(fixture.engine(10));
        let store = Arc::new(SqlitePersister::open(&path, ACCOUNT).unwrap());
        sm.cache(store.clone()).await;

        sm.enable().await.unwrap();
        sm.enabled(Some("sess-1".into())).await.unwrap();
        sm.handle().await.unwrap();
        sm.handle().await.unwrap();
        for stanza in [message(0), message(1), iq(2), presence(3)] {
            sm.track(stanza).await.unwrap();
        }
        sm.process(Some(1), false).await.unwrap();

        assert!(store.write_seq().await.unwrap() > 0);
    }

    // Second process: a fresh connection with no JID bound yet.
    let store = Arc::new(SqlitePersister::open(&path, ACCOUNT).unwrap());
    let snapshot = store.latest().await.unwrap().unwrap();
    assert_eq!(snapshot.id, Some("sess-1".into()));
    assert_eq!(snapshot.handled, 2);
    assert_eq!(snapshot.last_ack, 1);
    assert_eq!(stanza_ids(&snapshot.unacked), vec!["m1", "q2", "p3"]);

    let conn = Arc::new(MemoryConnection::new());
    let (sink, mut events) = ChannelSink::new();
    let sm = StreamManager::new(Arc::clone(&conn), sink, SmConfig::default().with_window_size(10))
        .unwrap();

    assert!(sm.restore(store.as_ref()).await.unwrap());
    sm.cache(store.clone()).await;
    assert_eq!(
        events.try_recv().unwrap(),
        SmEvent::SessionBound(ROMEO.into())
    );
    assert_eq!(sm.snapshot().await.jid, Some(ROMEO.into()));

    sm.negotiate().await.unwrap();
    assert_eq!(
        conn.take_sent(),
        vec![Outbound::Sm(SmRequest::Resume {
            handled: 2,
            previous_session: "sess-1".into(),
        })]
    );

    // The server saw m1 before the drop; the rest goes out again.
    sm.dispatch(SmResponse::Resumed {
        previous_session: "sess-1".into(),
        handled: Some(2),
    })
    .await
    .unwrap();

    match events.try_recv().unwrap() {
        SmEvent::StanzaAcked(stanza) => assert_eq!(stanza.id(), Some("m1")),
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(stanza_frames(&conn.take_sent()), vec!["q2", "p3"]);
    assert!(sm.is_started().await);
    assert_eq!(sm.unacked().await.len(), 2);

    let persisted = store.latest().await.unwrap().unwrap();
    assert_eq!(persisted.last_ack, 2);
    assert_eq!(stanza_ids(&persisted.unacked), vec!["q2", "p3"]);
}

#[tokio::test]
async fn test_suspend_then_resume_same_process() {
    init_tracing();
    let mut fixture = SessionFixture::new();
    let sm = StreamManager::from_engine(fixture.active_engine(1).await);

    sm.track(message(0)).await.unwrap();
    assert!(sm.is_ack_pending().await);
    sm.suspend().await;
    assert!(!sm.is_started().await);
    assert!(!sm.is_ack_pending().await);

    // Nothing is tracked while the connection is down.
    sm.track(message(1)).await.unwrap();
    assert_eq!(sm.unacked().await.len(), 1);
    fixture.connection.take_sent();

    sm.negotiate().await.unwrap();
    sm.dispatch(SmResponse::Resumed {
        previous_session: "sess-1".into(),
        handled: Some(0),
    })
    .await
    .unwrap();

    let sent = fixture.connection.take_sent();
    assert_eq!(
        sent[0],
        Outbound::Sm(SmRequest::Resume {
            handled: 0,
            previous_session: "sess-1".into(),
        })
    );
    assert_eq!(stanza_frames(&sent), vec!["m0"]);
    // The window is full again after the resend.
    assert_eq!(sent.last(), Some(&Outbound::Sm(SmRequest::Request)));
    assert!(fixture.acked_ids().is_empty());
}

#[tokio::test]
async fn test_failed_resumption_reports_and_reenables() {
    init_tracing();
    let mut fixture = SessionFixture::new();
    let sm = StreamManager::from_engine(fixture.active_engine(10).await);

    for n in 0..3 {
        sm.track(message(n)).await.unwrap();
    }
    sm.suspend().await;
    sm.negotiate().await.unwrap();
    sm.dispatch(SmResponse::Failed { handled: None })
        .await
        .unwrap();

    assert_eq!(fixture.failed_ids(), vec!["m0", "m1", "m2"]);
    assert!(!sm.can_resume().await);
    assert_eq!(sm.handled().await, 0);
    assert_eq!(sm.last_ack().await, 0);

    let last = fixture.store.last().unwrap();
    assert_eq!(last.id, None);
    assert!(last.unacked.is_empty());

    // With no session left, negotiation starts over.
    fixture.connection.take_sent();
    sm.negotiate().await.unwrap();
    assert_eq!(
        fixture.connection.take_sent(),
        vec![Outbound::Sm(SmRequest::Enable { resume: true })]
    );
}

#[tokio::test]
async fn test_concurrent_callers_never_interleave() {
    init_tracing();
    let fixture = SessionFixture::new();
    let sm = StreamManager::from_engine(fixture.active_engine(4).await);
    let writes_before = fixture.store.write_count();

    let mut tasks = Vec::new();
    for n in 0..20 {
        let sm = sm.clone();
        tasks.push(tokio::spawn(async move {
            sm.track(message(n)).await.unwrap();
            sm.handle().await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(sm.unacked().await.len(), 20);
    assert_eq!(sm.handled().await, 20);

    // Every write extends the one before it by exactly one step.
    let history = fixture.store.history();
    for pair in history[writes_before..].windows(2) {
        let grew = pair[1].unacked.len() - pair[0].unacked.len();
        let counted = pair[1].handled - pair[0].handled;
        assert_eq!(grew + counted as usize, 1);
    }
}

#[tokio::test]
async fn test_window_size_change_applies_to_next_track() {
    let fixture = SessionFixture::new();
    let sm = StreamManager::from_engine(fixture.active_engine(5).await);

    sm.track(message(0)).await.unwrap();
    sm.track(message(1)).await.unwrap();
    assert!(fixture.connection.sent().is_empty());

    assert!(sm.set_window_size(0).await.is_err());
    sm.set_window_size(3).await.unwrap();
    sm.track(message(2)).await.unwrap();
    assert_eq!(
        fixture.connection.take_sent(),
        vec![Outbound::Sm(SmRequest::Request)]
    );
}
