//! Secure random key, IV and secret generation.
//!
//! All bytes come from the operating system CSPRNG.  The generator hands
//! ownership of the buffer to the caller and keeps nothing behind.

use rand::TryRngCore;
use zeroize::Zeroizing;

use crate::crypto::validate::assert_integer_in_range;
use crate::errors::{CryptoError, Result};

/// AES-256 key length in bytes.
pub const AES_KEY_LEN: usize = 32;

/// AES block / CBC IV length in bytes.
pub const AES_IV_LEN: usize = 16;

/// Default length for `generate_secret`.
pub const DEFAULT_SECRET_LEN: usize = 32;

/// Upper bound for `generate_secret`.
pub const MAX_SECRET_LEN: usize = 1024;

/// Freshly generated random bytes, readable as raw bytes or hex.
pub struct GeneratedSecret {
    bytes: Zeroizing<Vec<u8>>,
}

impl GeneratedSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering of the bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes.as_slice())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the bytes out, still wrapped so they are wiped on drop.
    pub fn into_bytes(self) -> Zeroizing<Vec<u8>> {
        self.bytes
    }
}

impl std::fmt::Debug for GeneratedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeneratedSecret(<{} bytes>)", self.bytes.len())
    }
}

/// Fill a new buffer of `len` bytes from the OS RNG.
fn random_bytes(len: usize) -> Result<GeneratedSecret> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::encryption("secure random source failed", e))?;
    Ok(GeneratedSecret { bytes })
}

/// Generate a random 32-byte AES-256 key.
pub fn generate_aes_key() -> Result<GeneratedSecret> {
    random_bytes(AES_KEY_LEN)
}

/// Generate a random 16-byte CBC initialization vector.
pub fn generate_aes_iv() -> Result<GeneratedSecret> {
    random_bytes(AES_IV_LEN)
}

/// Generate a random secret of `length` bytes (1 to `MAX_SECRET_LEN`).
pub fn generate_secret(length: usize) -> Result<GeneratedSecret> {
    let length = assert_integer_in_range(length as f64, "length", 1, MAX_SECRET_LEN as u32)?;
    random_bytes(length as usize)
}
