//! Wire protocol: password handshake and message framing.
//!
//! The handshake runs once, immediately after connecting, before any frame
//! is exchanged. Everything after it is a sequence of [`frame`] records
//! carrying sealed messages.

pub mod frame;
pub mod handshake;

pub use frame::{decode, encode, MAX_CIPHERTEXT_LEN};
pub use handshake::{authenticate_initiator, authenticate_listener};
