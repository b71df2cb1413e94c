//! Password handshake.
//!
//! Runs once per connection, before any frame is exchanged. The initiator
//! writes its password as raw UTF-8 (no length prefix, no terminator); the
//! listener does one bounded read and compares. There is no explicit ACK on
//! the wire: the initiator infers acceptance by probing the socket — a peer
//! that rejected us closes the connection, a peer that accepted stays quiet.
//!
//! The handshake is a plain password comparison, not a cryptographic proof.
//! The real gate is the key derivation: both sides derive their session key
//! from their own password, so a peer that slipped past the comparison with
//! the wrong password still cannot produce or read a single valid message.
//!
//! On mismatch the listener always rejects and closes; it never falls
//! through to a session.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::transport::Connection;

/// Upper bound on the listener's single handshake read. A password longer
/// than this cannot authenticate.
pub const HANDSHAKE_BUFFER_LEN: usize = 1024;

/// How long the initiator watches the socket for a rejection before
/// assuming it was accepted.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// Listener side: read the peer's password and gate the session on it.
///
/// A single read of up to [`HANDSHAKE_BUFFER_LEN`] bytes is treated as the
/// complete password; a password split across later reads is not retried.
/// On mismatch the connection is shut down before returning
/// [`ChatError::HandshakeRejected`].
pub async fn authenticate_listener(
    conn: &mut Connection,
    password: &str,
) -> Result<(), ChatError> {
    let mut buf = vec![0u8; HANDSHAKE_BUFFER_LEN];
    let n = conn.read(&mut buf).await?;
    if n == 0 {
        debug!(peer = %conn.peer_addr(), "peer closed during handshake");
        return Err(ChatError::HandshakeRejected);
    }

    let accepted = match std::str::from_utf8(&buf[..n]) {
        Ok(received) => received == password,
        Err(_) => false,
    };

    if !accepted {
        warn!(peer = %conn.peer_addr(), "rejecting connection: password mismatch");
        let _ = conn.shutdown().await;
        return Err(ChatError::HandshakeRejected);
    }

    debug!(peer = %conn.peer_addr(), "handshake accepted");
    Ok(())
}

/// Initiator side: present the password, then probe for rejection.
///
/// The probe read resolves three ways:
/// - the peer closed the socket (read returned 0): rejected;
/// - bytes arrived before we sent any frame: protocol violation, rejected;
/// - nothing happened within [`PROBE_TIMEOUT`]: accepted.
pub async fn authenticate_initiator(
    conn: &mut Connection,
    password: &str,
) -> Result<(), ChatError> {
    conn.write_all(password.as_bytes()).await?;
    conn.flush().await?;

    let mut probe = [0u8; 1];
    match timeout(PROBE_TIMEOUT, conn.read(&mut probe)).await {
        Ok(Ok(0)) => {
            debug!(peer = %conn.peer_addr(), "peer closed after password: rejected");
            Err(ChatError::HandshakeRejected)
        }
        Ok(Ok(_)) => {
            warn!(peer = %conn.peer_addr(), "unexpected bytes before first frame");
            Err(ChatError::HandshakeRejected)
        }
        Ok(Err(e)) => Err(ChatError::Io(e)),
        Err(_elapsed) => {
            debug!(peer = %conn.peer_addr(), "handshake probe quiet: accepted");
            Ok(())
        }
    }
}
