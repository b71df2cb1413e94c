//! Chat error types.

use thiserror::Error;

/// Errors that can occur while establishing or running a chat session.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The peer presented the wrong password, or the listener closed the
    /// connection during the handshake.
    #[error("Handshake rejected: password mismatch")]
    HandshakeRejected,

    /// The stream ended before a full frame arrived.
    ///
    /// A close at a frame boundary is indistinguishable from a close
    /// mid-frame, so both map here and are treated as a normal session end.
    #[error("Stream ended before a complete frame was read")]
    TruncatedStream,

    /// Authentication tag mismatch on decrypt. Fatal for the session; no
    /// partial plaintext is ever produced.
    #[error("Message authentication failed")]
    AuthenticationFailed,

    /// A frame declared a ciphertext length above the configured maximum.
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge {
        /// Declared ciphertext length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A frame field had an impossible declared length (e.g. a nonce that
    /// is not 12 bytes).
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Cipher setup or encryption failed. Not expected at runtime with a
    /// well-formed key.
    #[error("Encryption failed: {0}")]
    Crypto(String),

    /// Transport error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
