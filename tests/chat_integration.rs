//! End-to-end tests over loopback TCP: handshake, bidirectional chat, and
//! rejection paths, exercising the same code the binary wires together.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use termchat::protocol::handshake;
use termchat::session::{ChatSession, CloseReason, SessionEvent};
use termchat::transport::{Connection, Listener};
use termchat::ChatError;

struct Peer {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    lines: mpsc::UnboundedSender<String>,
    done: tokio::task::JoinHandle<CloseReason>,
}

fn start_session(conn: Connection, password: &str) -> Peer {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(conn, password, event_tx, line_rx);
    Peer {
        events: event_rx,
        lines: line_tx,
        done: tokio::spawn(session.run()),
    }
}

async fn expect_message(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> String {
    loop {
        match events.recv().await.expect("event stream ended") {
            SessionEvent::MessageReceived(text) => return text,
            SessionEvent::Started { .. } => continue,
            SessionEvent::Closed { reason } => panic!("session closed early: {reason}"),
        }
    }
}

async fn expect_closed(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> CloseReason {
    loop {
        match events.recv().await.expect("event stream ended") {
            SessionEvent::Closed { reason } => return reason,
            _ => continue,
        }
    }
}

/// The full happy path: handshake with a shared password, one message in
/// each direction, then a disconnect observed by the other side.
#[tokio::test]
async fn test_end_to_end_chat() {
    let password = "hunter2";

    let listener = Listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let initiator = tokio::spawn(async move {
        let mut conn = Connection::connect(addr).await.unwrap();
        handshake::authenticate_initiator(&mut conn, password)
            .await
            .unwrap();
        let mut peer = start_session(conn, password);

        // A speaks first.
        assert_eq!(expect_message(&mut peer.events).await, "hello");

        peer.lines.send("world".to_string()).unwrap();

        // Give the reply time to flush before hanging up.
        sleep(Duration::from_millis(200)).await;
        drop(peer.lines);
        assert_eq!(expect_closed(&mut peer.events).await, CloseReason::LocalClosed);
        assert_eq!(peer.done.await.unwrap(), CloseReason::LocalClosed);
    });

    let mut conn = listener.accept().await.unwrap();
    handshake::authenticate_listener(&mut conn, password)
        .await
        .unwrap();
    let mut peer = start_session(conn, password);

    // The initiator's acceptance probe watches the socket briefly after the
    // handshake; stay quiet until it has resolved.
    sleep(Duration::from_millis(500)).await;
    peer.lines.send("hello".to_string()).unwrap();

    assert_eq!(expect_message(&mut peer.events).await, "world");

    // B hung up; A's session must notice and emit exactly one Closed.
    assert_eq!(expect_closed(&mut peer.events).await, CloseReason::PeerDisconnected);
    assert!(peer.events.recv().await.is_none());
    assert_eq!(peer.done.await.unwrap(), CloseReason::PeerDisconnected);

    initiator.await.unwrap();
}

/// A wrong password is rejected by the listener and observed by the
/// initiator's probe; no session begins on either side.
#[tokio::test]
async fn test_handshake_mismatch_rejected() {
    let listener = Listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let initiator = tokio::spawn(async move {
        let mut conn = Connection::connect(addr).await.unwrap();
        handshake::authenticate_initiator(&mut conn, "wrong").await
    });

    let mut conn = listener.accept().await.unwrap();
    let listener_result = handshake::authenticate_listener(&mut conn, "hunter2").await;
    assert!(matches!(
        listener_result,
        Err(ChatError::HandshakeRejected)
    ));
    drop(conn);

    let initiator_result = initiator.await.unwrap();
    assert!(matches!(
        initiator_result,
        Err(ChatError::HandshakeRejected)
    ));
}

/// After one rejected attempt the listener can still accept a correct one,
/// mirroring the server's accept loop.
#[tokio::test]
async fn test_listener_survives_rejected_attempt() {
    let password = "hunter2";

    let listener = Listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let attempts = tokio::spawn(async move {
        let mut bad = Connection::connect(addr).await.unwrap();
        let rejected = handshake::authenticate_initiator(&mut bad, "wrong").await;
        assert!(matches!(rejected, Err(ChatError::HandshakeRejected)));
        drop(bad);

        let mut good = Connection::connect(addr).await.unwrap();
        handshake::authenticate_initiator(&mut good, password)
            .await
            .unwrap();
    });

    let mut first = listener.accept().await.unwrap();
    assert!(handshake::authenticate_listener(&mut first, password)
        .await
        .is_err());
    drop(first);

    let mut second = listener.accept().await.unwrap();
    handshake::authenticate_listener(&mut second, password)
        .await
        .unwrap();

    attempts.await.unwrap();
}

/// Messages survive the full seal/frame/socket/decode/open pipeline intact
/// for non-ASCII content.
#[tokio::test]
async fn test_unicode_messages() {
    let password = "pässwörd ünïcode";

    let listener = Listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let initiator = tokio::spawn(async move {
        let mut conn = Connection::connect(addr).await.unwrap();
        handshake::authenticate_initiator(&mut conn, password)
            .await
            .unwrap();
        let mut peer = start_session(conn, password);

        assert_eq!(expect_message(&mut peer.events).await, "привет 🦀 你好");

        drop(peer.lines);
        let _ = expect_closed(&mut peer.events).await;
    });

    let mut conn = listener.accept().await.unwrap();
    handshake::authenticate_listener(&mut conn, password)
        .await
        .unwrap();
    let mut peer = start_session(conn, password);

    sleep(Duration::from_millis(500)).await;
    peer.lines.send("привет 🦀 你好".to_string()).unwrap();

    let _ = expect_closed(&mut peer.events).await;
    initiator.await.unwrap();
}
