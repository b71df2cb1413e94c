//! Chat session: the concurrent duplex loop over one connection.
//!
//! A session owns the connection after a successful handshake. It derives
//! the symmetric key once, then runs two independent loops on the split
//! stream halves:
//!
//! - receive: frame decode -> AEAD open -> [`SessionEvent::MessageReceived`]
//! - send: outbound line -> AEAD seal -> frame encode -> socket
//!
//! The loops share nothing mutable; the key is read-only behind an `Arc`.
//! Whichever loop finishes first ends the session: the sibling task is
//! aborted, both stream halves are released (closing the socket once), and
//! exactly one [`SessionEvent::Closed`] is emitted.
//!
//! Presentation is not this module's concern. The session reports structured
//! events over a channel and the CLI layer decides how to render them.

use std::fmt;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::crypto::{aead, kdf, DerivedKey};
use crate::error::ChatError;
use crate::protocol::frame;
use crate::transport::{Connection, ConnectionReader, ConnectionWriter};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the connection (or the stream truncated mid-frame,
    /// which is indistinguishable).
    PeerDisconnected,
    /// A message failed authentication. Fatal; never retried.
    IntegrityFailure,
    /// A socket-level read or write failed.
    TransportFailed,
    /// Our own input ended; we shut the write side down.
    LocalClosed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerDisconnected => write!(f, "peer disconnected"),
            CloseReason::IntegrityFailure => write!(f, "message integrity failure"),
            CloseReason::TransportFailed => write!(f, "transport failure"),
            CloseReason::LocalClosed => write!(f, "closed locally"),
        }
    }
}

/// Structured events a session reports to its output surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is live; frames may now flow.
    Started {
        /// Peer address, for display.
        peer: String,
    },
    /// A decrypted message from the peer.
    MessageReceived(String),
    /// The session ended. Emitted exactly once.
    Closed {
        /// What ended it.
        reason: CloseReason,
    },
}

/// An authenticated, encrypted chat session over one connection.
pub struct ChatSession {
    connection: Connection,
    key: DerivedKey,
    events: mpsc::UnboundedSender<SessionEvent>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl ChatSession {
    /// Build a session over an authenticated connection.
    ///
    /// Derives the session key from the password here, once. Both peers
    /// must hold the same password or every received message will fail
    /// authentication — the handshake gates entry, the key enforces it.
    pub fn new(
        connection: Connection,
        password: &str,
        events: mpsc::UnboundedSender<SessionEvent>,
        outbound: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            connection,
            key: kdf::derive(password),
            events,
            outbound,
        }
    }

    /// Run the session until either direction ends.
    ///
    /// Returns the close reason after emitting the final
    /// [`SessionEvent::Closed`].
    pub async fn run(self) -> CloseReason {
        let ChatSession {
            connection,
            key,
            events,
            outbound,
        } = self;

        let peer = connection.peer_addr().to_string();
        let _ = events.send(SessionEvent::Started { peer: peer.clone() });

        let (reader, writer) = connection.into_split();
        let key = Arc::new(key);

        let mut recv_task = tokio::spawn(recv_loop(reader, Arc::clone(&key), events.clone()));
        let mut send_task = tokio::spawn(send_loop(writer, key, outbound));

        // First loop to finish wins; the sibling is aborted rather than
        // awaited, and dropping its stream half releases the socket.
        let reason = tokio::select! {
            recv = &mut recv_task => {
                send_task.abort();
                recv.unwrap_or(CloseReason::TransportFailed)
            }
            send = &mut send_task => {
                recv_task.abort();
                send.unwrap_or(CloseReason::TransportFailed)
            }
        };

        debug!(%peer, %reason, "session ended");
        let _ = events.send(SessionEvent::Closed { reason });
        reason
    }
}

async fn recv_loop(
    mut reader: ConnectionReader,
    key: Arc<DerivedKey>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> CloseReason {
    loop {
        let sealed = match frame::decode(&mut reader).await {
            Ok(sealed) => sealed,
            Err(ChatError::TruncatedStream) => return CloseReason::PeerDisconnected,
            Err(e) => {
                warn!(error = %e, "receive loop ending");
                return CloseReason::TransportFailed;
            }
        };

        let plaintext = match aead::open(&sealed, &key) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(error = %e, "dropping session on undecryptable frame");
                return CloseReason::IntegrityFailure;
            }
        };

        let text = String::from_utf8_lossy(&plaintext).into_owned();
        if events.send(SessionEvent::MessageReceived(text)).is_err() {
            // Output surface went away; nobody is listening anymore.
            return CloseReason::LocalClosed;
        }
    }
}

async fn send_loop(
    mut writer: ConnectionWriter,
    key: Arc<DerivedKey>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) -> CloseReason {
    while let Some(line) = outbound.recv().await {
        if line.is_empty() {
            continue;
        }

        let sealed = match aead::seal(line.as_bytes(), &key) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!(error = %e, "encryption failed; ending session");
                return CloseReason::TransportFailed;
            }
        };

        let bytes = frame::encode(&sealed);
        if let Err(e) = writer.write_all(&bytes).await {
            debug!(error = %e, "write failed");
            return CloseReason::TransportFailed;
        }
        if let Err(e) = writer.flush().await {
            debug!(error = %e, "flush failed");
            return CloseReason::TransportFailed;
        }
    }

    // Input closed: signal EOF so the peer's receive loop ends cleanly.
    let _ = writer.shutdown().await;
    CloseReason::LocalClosed
}
