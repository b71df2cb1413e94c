//! Cryptographic primitives for the chat protocol.
//!
//! Two layers:
//! - [`kdf`]: turns the shared password into a fixed-length symmetric key
//!   (PBKDF2-HMAC-SHA256, fixed salt, 100,000 iterations).
//! - [`aead`]: AES-256-GCM with a detached tag, one fresh random nonce per
//!   message.
//!
//! Both peers derive the same key from the same password independently; key
//! material is never transmitted.

pub mod aead;
pub mod kdf;

pub use aead::{open, seal, SealedMessage, NONCE_LEN, TAG_LEN};
pub use kdf::{derive, DerivedKey, KEY_LEN};
