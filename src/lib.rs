//! # termchat — peer-to-peer encrypted terminal chat
//!
//! Two endpoints, one listener and one initiator, establish a single TCP
//! connection, authenticate each other with a shared password, and exchange
//! authenticated-encrypted text messages until either side disconnects.
//!
//! ## Protocol
//!
//! - **Handshake**: the initiator writes its password as raw UTF-8; the
//!   listener does one bounded read and compares. Mismatch: reject and
//!   close. There is no ACK — the initiator probes the socket to tell
//!   acceptance from rejection.
//! - **Key derivation**: both sides independently derive a 32-byte key via
//!   PBKDF2-HMAC-SHA256 (fixed salt, 100,000 iterations). The key never
//!   crosses the wire.
//! - **Messages**: AES-256-GCM with a fresh random nonce per message, sent
//!   as length-prefixed frames: `[len][nonce][len][tag][len][ciphertext]`,
//!   lengths little-endian u32.
//! - **Session**: receive and send loops run concurrently on the split
//!   stream halves; the first to finish ends the session and the connection
//!   is closed once.
//!
//! The handshake is a bare password comparison, not a proof: the actual
//! gate is that a peer with the wrong password derives the wrong key and
//! cannot produce a single authenticatable message.
//!
//! ## Example
//!
//! ```rust
//! use termchat::crypto::{aead, kdf};
//! use termchat::protocol::frame;
//!
//! // Both peers derive the same key from the shared password.
//! let key = kdf::derive("hunter2");
//!
//! // Seal a message and put it on the wire.
//! let sealed = aead::seal(b"hello", &key).unwrap();
//! let bytes = frame::encode(&sealed);
//! assert!(bytes.len() > b"hello".len());
//!
//! // The receiving side opens it with its own derived key.
//! let plaintext = aead::open(&sealed, &key).unwrap();
//! assert_eq!(plaintext, b"hello");
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::{ChatConfig, Mode};
pub use error::ChatError;
pub use session::{ChatSession, CloseReason, SessionEvent};
pub use transport::{Connection, Listener};
