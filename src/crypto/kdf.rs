//! Password-based key derivation.
//!
//! The derivation parameters are protocol constants: both peers must use the
//! same salt, iteration count and hash, or their keys will not match and
//! every message will fail authentication.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

/// Output key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Fixed salt shared by both peers.
pub const KDF_SALT: &[u8] = b"FixedChatSalt123";

/// PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;

/// A symmetric session key derived from the shared password.
///
/// Computed once per session, read-only afterwards, and zeroized on drop.
/// The raw bytes are only handed to the AEAD layer.
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.write_str("DerivedKey(..)")
    }
}

/// Derives the 256-bit session key from a password.
///
/// Deterministic: the same password always yields the same key. An empty
/// password is accepted and yields a valid (if weak) key; rejecting it is
/// the CLI layer's job.
pub fn derive(password: &str) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key);
    DerivedKey(key)
}
