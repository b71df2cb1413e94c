//! Authenticated encryption for chat messages.
//!
//! AES-256-GCM with a detached tag: the nonce, tag and ciphertext travel as
//! separate frame fields, so `seal` returns them separately rather than
//! concatenated. Ciphertext length always equals plaintext length.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};

use crate::crypto::kdf::DerivedKey;
use crate::error::ChatError;

/// Nonce size for AES-GCM.
pub const NONCE_LEN: usize = 12;

/// Authentication tag size for AES-GCM.
pub const TAG_LEN: usize = 16;

/// One encrypted message, ready for framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// Per-message nonce, freshly random for every `seal` call.
    pub nonce: [u8; NONCE_LEN],
    /// Detached GCM authentication tag.
    pub tag: [u8; TAG_LEN],
    /// Ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
}

/// Encrypts one message under the session key.
///
/// A fresh random nonce is drawn from the OS RNG on every call. Nonce
/// uniqueness under a given key rests on that randomness, not on a counter.
pub fn seal(plaintext: &[u8], key: &DerivedKey) -> Result<SealedMessage, ChatError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ChatError::Crypto(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let mut ciphertext = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut ciphertext)
        .map_err(|e| ChatError::Crypto(e.to_string()))?;

    Ok(SealedMessage {
        nonce,
        tag: tag.into(),
        ciphertext,
    })
}

/// Decrypts one message and verifies its tag.
///
/// Fails closed: a tag mismatch yields [`ChatError::AuthenticationFailed`]
/// and no plaintext, with no indication of how much of the input matched.
pub fn open(sealed: &SealedMessage, key: &DerivedKey) -> Result<Vec<u8>, ChatError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ChatError::Crypto(e.to_string()))?;

    let mut plaintext = sealed.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&sealed.nonce),
            b"",
            &mut plaintext,
            Tag::from_slice(&sealed.tag),
        )
        .map_err(|_| ChatError::AuthenticationFailed)?;

    Ok(plaintext)
}
