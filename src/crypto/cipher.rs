//! AES-256-CBC encryption service.
//!
//! Plaintext is UTF-8 encoded, padded with PKCS#7 and encrypted under a
//! 32-byte key and 16-byte IV.  Ciphertext, key and IV travel as hex.
//!
//! The service caches nothing between calls: every key and IV is either
//! passed in, taken from the immutable configured defaults, or generated
//! fresh for that call.
//!
//! CBC carries no authentication.  A wrong key or IV is only detected
//! when the PKCS#7 padding or UTF-8 check fails: a wrong IV corrupts just
//! the first block, so it is caught only when that block holds the
//! padding, and a wrong key still yields valid padding about once in 256.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::random::{self, GeneratedSecret, AES_IV_LEN, AES_KEY_LEN};
use crate::crypto::validate::{
    assert_hex_ciphertext, assert_non_empty, normalize_key_material, KeyMaterial,
};
use crate::errors::{CryptoError, DecryptFailure, Result};
use crate::logging::Diagnostics;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Output of one `encrypt` call: ciphertext plus the key and IV that
/// produced it, all lowercase hex.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub encrypted: String,
    pub key: String,
    pub iv: String,
}

impl std::fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedPayload")
            .field("encrypted", &self.encrypted)
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

/// AES-256-CBC facade with validation and error classification.
#[derive(Clone)]
pub struct AesService {
    default_key: Option<Zeroizing<Vec<u8>>>,
    default_iv: Option<Zeroizing<Vec<u8>>>,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for AesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesService")
            .field("has_default_key", &self.default_key.is_some())
            .field("has_default_iv", &self.default_iv.is_some())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl AesService {
    /// Service with no default key material.
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            default_key: None,
            default_iv: None,
            diagnostics,
        }
    }

    /// Service whose `encrypt` falls back to the given key / IV when the
    /// caller omits one.  Both are checked like any other key input.
    pub fn with_defaults(
        key: Option<&KeyMaterial>,
        iv: Option<&KeyMaterial>,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        Ok(Self {
            default_key: normalize_key_material(key, "aesKey", Some(AES_KEY_LEN))?,
            default_iv: normalize_key_material(iv, "aesIv", Some(AES_IV_LEN))?,
            diagnostics,
        })
    }

    pub fn generate_key(&self) -> Result<GeneratedSecret> {
        let key = random::generate_aes_key()?;
        self.diagnostics
            .debug_secret("key", &key.to_hex(), "generated AES key");
        Ok(key)
    }

    pub fn generate_iv(&self) -> Result<GeneratedSecret> {
        let iv = random::generate_aes_iv()?;
        self.diagnostics
            .debug_secret("iv", &iv.to_hex(), "generated AES IV");
        Ok(iv)
    }

    /// Encrypt `data`.  A missing key or IV is taken from the configured
    /// defaults, or generated when there is none.
    pub fn encrypt(
        &self,
        data: &str,
        key: Option<&KeyMaterial>,
        iv: Option<&KeyMaterial>,
    ) -> Result<EncryptedPayload> {
        assert_non_empty(data, "data")?;

        let key = match normalize_key_material(key, "key", Some(AES_KEY_LEN))? {
            Some(key) => key,
            None => match &self.default_key {
                Some(key) => key.clone(),
                None => self.generate_key()?.into_bytes(),
            },
        };
        let iv = match normalize_key_material(iv, "iv", Some(AES_IV_LEN))? {
            Some(iv) => iv,
            None => match &self.default_iv {
                Some(iv) => iv.clone(),
                None => self.generate_iv()?.into_bytes(),
            },
        };

        let cipher = Aes256CbcEnc::new_from_slices(&key, &iv)
            .map_err(|e| CryptoError::encryption("cipher initialisation failed", e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(data.as_bytes());

        self.diagnostics.debug(
            &[("bytes", ciphertext.len().to_string())],
            "encrypted data",
        );

        Ok(EncryptedPayload {
            encrypted: hex::encode(ciphertext),
            key: hex::encode(key.as_slice()),
            iv: hex::encode(iv.as_slice()),
        })
    }

    /// Decrypt hex `encrypted_data` with the exact key and IV used to
    /// produce it.
    pub fn decrypt(
        &self,
        encrypted_data: &str,
        key: &KeyMaterial,
        iv: &KeyMaterial,
    ) -> Result<String> {
        assert_hex_ciphertext(encrypted_data)?;
        let key = normalize_key_material(Some(key), "key", Some(AES_KEY_LEN))?
            .ok_or_else(|| CryptoError::invalid_key("key is required"))?;
        let iv = normalize_key_material(Some(iv), "iv", Some(AES_IV_LEN))?
            .ok_or_else(|| CryptoError::invalid_key("iv is required"))?;

        let ciphertext = hex::decode(encrypted_data)
            .map_err(|e| CryptoError::decryption_from(DecryptFailure::MalformedCiphertext, e))?;

        let cipher = Aes256CbcDec::new_from_slices(&key, &iv).map_err(|e| {
            CryptoError::decryption_from(DecryptFailure::CipherSetup, e.to_string())
        })?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|_| CryptoError::decryption(DecryptFailure::BadDecrypt))?,
        );

        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| CryptoError::decryption(DecryptFailure::InvalidPlaintext))?
            .to_string();

        self.diagnostics
            .debug(&[("length", text.len().to_string())], "decrypted data");

        Ok(text)
    }
}
